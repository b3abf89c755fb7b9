//! Arhem äldreboende (Mashie). `MenuAlternativeName` mixes meal and
//! variant, e.g. `"Lunch dagens"` or `"Middag 1"`; split it into meal
//! `Lunch`/`Middag`/`Kvällsmat` and label `Dagens`/`Alt 1`.

use crate::core::normalize::normalize;
use crate::domain::model::{MenuEntry, RawCourse};
use crate::utils::error::ProcessorError;
use chrono::NaiveDate;

const MEAL_PREFIXES: [&str; 3] = ["lunch", "middag", "kvällsmat"];

fn split_alternative(alt: &str) -> (String, Option<String>) {
    let alt = normalize(alt);
    let folded = alt.to_lowercase();

    match folded.as_str() {
        "dessert" => return ("Lunch".to_string(), Some("Dessert".to_string())),
        "timbal dess" => return ("Lunch".to_string(), Some("Dessert Timbal".to_string())),
        _ => {}
    }

    for prefix in MEAL_PREFIXES {
        if !folded.starts_with(prefix) {
            continue;
        }
        let Some((meal, rest)) = alt.split_at_checked(prefix.len()) else {
            break;
        };
        let rest = rest.trim();
        let label = if rest.is_empty() {
            None
        } else if rest.chars().all(|c| c.is_ascii_digit()) {
            Some(format!("Alt {}", rest))
        } else {
            Some(normalize(rest))
        };
        return (meal.to_string(), label);
    }

    (alt, None)
}

pub fn entry_processor(
    _date: NaiveDate,
    order: usize,
    raw: &RawCourse,
) -> Result<Option<MenuEntry>, ProcessorError> {
    let dish = raw["DayMenuName"].as_str().unwrap_or("");
    let entry = match raw["MenuAlternativeName"].as_str() {
        Some(alt) if !alt.trim().is_empty() => {
            let (meal, label) = split_alternative(alt);
            MenuEntry::create(order, Some(&meal), dish, label)
        }
        _ => MenuEntry::create(order, None, dish, None),
    };
    Ok(Some(entry))
}
