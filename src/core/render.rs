use crate::domain::model::MenuEntry;
use crate::domain::ports::SummaryRenderer;

pub const SUMMARY_SEPARATOR: &str = " | ";

/// Dishes in list order, joined with `" | "`.
pub fn readable_day_summary(entries: &[MenuEntry]) -> String {
    entries
        .iter()
        .map(|e| e.dish.as_str())
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

/// Bulleted day menu. Adjacent entries sharing a meal go under one `[Meal]`
/// header; a meal that shows up again later opens a new block. Entries
/// without a meal get no header.
pub fn readable_day_menu(entries: &[MenuEntry]) -> String {
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut current_meal: Option<Option<&str>> = None;

    for entry in entries {
        let meal = entry.meal.as_deref();
        if current_meal != Some(meal) {
            let mut block = Vec::new();
            if let Some(m) = meal {
                block.push(format!("[{}]", m));
            }
            blocks.push(block);
            current_meal = Some(meal);
        }

        let line = match entry.label.as_deref() {
            Some(label) => format!("• {}: {}", label, entry.dish),
            None => format!("• {}", entry.dish),
        };
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    blocks
        .iter()
        .map(|block| block.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run the custom renderer if one is set, falling back to
/// [`readable_day_summary`] when it fails.
pub fn render_summary(entries: &[MenuEntry], custom: Option<&SummaryRenderer>) -> String {
    let Some(renderer) = custom else {
        return readable_day_summary(entries);
    };

    match renderer(entries) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(
                "Custom summary renderer failed ({}), using default. Entries: {}",
                e,
                serde_json::to_string(entries).unwrap_or_else(|_| format!("{:?}", entries))
            );
            readable_day_summary(entries)
        }
    }
}
