//! Candidate filter keywords taken from existing menu data.

use crate::core::normalize::normalize;
use crate::domain::model::{FilterKeywords, MenuData, MenuEntry};
use chrono::NaiveDate;

const NO_RESULTS_INFO: &str = "No meals or dish labels found in menu data.";
const INCOMPLETE_WARNING: &str = " Warning: other days include additional meals/labels; \
discovery may be incomplete. See logs for details.";

#[derive(Debug, Default)]
struct KeywordSet {
    meals: Vec<String>,
    labels: Vec<String>,
}

impl KeywordSet {
    fn from_entries<'a>(entries: impl IntoIterator<Item = &'a MenuEntry>) -> Self {
        let mut set = Self::default();
        for entry in entries {
            set.add(entry);
        }
        set
    }

    fn add(&mut self, entry: &MenuEntry) {
        push_unique(&mut self.meals, entry.meal.as_deref());
        push_unique(&mut self.labels, entry.label.as_deref());
    }

    fn has_signal(&self) -> bool {
        !self.meals.is_empty() || !self.labels.is_empty()
    }
}

fn push_unique(target: &mut Vec<String>, raw: Option<&str>) {
    let Some(raw) = raw else { return };
    let value = normalize(raw);
    if !value.is_empty() && !target.contains(&value) {
        target.push(value);
    }
}

fn missing_from<'a>(all: &'a [String], chosen: &[String]) -> Vec<&'a str> {
    all.iter()
        .filter(|v| !chosen.contains(v))
        .map(String::as_str)
        .collect()
}

/// Sample one day of `menu` for meal and label keywords.
///
/// The first date on or after `reference` with any meal or label wins; if
/// none exists the dates before `reference` are tried, newest first. When
/// other days carry keywords the chosen day lacks, a warning is appended to
/// `info`.
pub fn discover_keywords(menu: &MenuData, reference: NaiveDate) -> FilterKeywords {
    let forward = menu.iter().filter(|(date, _)| *date >= reference);
    let backward = menu.iter().rev().filter(|(date, _)| *date < reference);

    let chosen = forward
        .chain(backward)
        .map(|(date, entries)| (date, KeywordSet::from_entries(entries)))
        .find(|(_, set)| set.has_signal());

    let Some((chosen_date, chosen)) = chosen else {
        return FilterKeywords {
            meals: Vec::new(),
            labels: Vec::new(),
            info: NO_RESULTS_INFO.to_string(),
        };
    };

    let all = KeywordSet::from_entries(menu.iter().flat_map(|(_, entries)| entries));
    let extra_meals = missing_from(&all.meals, &chosen.meals);
    let extra_labels = missing_from(&all.labels, &chosen.labels);

    let mut info = format!(
        "Found {} results for meals, and {} dish labels in menu data.",
        chosen.meals.len(),
        chosen.labels.len()
    );
    if !extra_meals.is_empty() || !extra_labels.is_empty() {
        tracing::warn!(
            "Keyword discovery used {} but other days add meals {:?} and labels {:?}",
            chosen_date,
            extra_meals,
            extra_labels
        );
        info.push_str(INCOMPLETE_WARNING);
    }

    FilterKeywords {
        meals: chosen.meals,
        labels: chosen.labels,
        info,
    }
}
