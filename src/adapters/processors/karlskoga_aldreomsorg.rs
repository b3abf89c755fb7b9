//! Karlskoga äldreomsorg (Matilda). Alternatives are published as separate
//! meals (`"Fiskalternativ"`, `"Dessert"`); fold them into `Lunch` and keep
//! the meal name as label.

use crate::core::normalize::normalize;
use crate::domain::model::{MenuEntry, RawCourse};
use crate::utils::error::ProcessorError;
use chrono::NaiveDate;

pub fn entry_processor(
    _date: NaiveDate,
    order: usize,
    raw: &RawCourse,
) -> Result<Option<MenuEntry>, ProcessorError> {
    let meal_name = raw["mealName"]
        .as_str()
        .ok_or_else(|| ProcessorError("course has no mealName".to_string()))?;
    let dish = raw["name"]
        .as_str()
        .ok_or_else(|| ProcessorError("course has no name".to_string()))?;
    let option = raw["optionName"].as_str().map(str::to_string);

    let folded = meal_name.to_lowercase();
    let entry = if folded.contains("alternativ") || folded == "dessert" {
        MenuEntry::create(order, Some("Lunch"), dish, Some(normalize(meal_name)))
    } else {
        MenuEntry::create(order, Some(meal_name), dish, option)
    };
    Ok(Some(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn test_alternative_meal_folds_into_lunch() {
        let raw = json!({"mealName": "Fiskalternativ", "name": "Fiskgryta, (potatis)", "optionName": ""});
        let entry = entry_processor(date(), 2, &raw).unwrap().unwrap();
        assert_eq!(entry.meal.as_deref(), Some("Lunch"));
        assert_eq!(entry.label.as_deref(), Some("Fiskalternativ"));
    }

    #[test]
    fn test_regular_meal_keeps_option() {
        let raw = json!({"mealName": "Kvällsmat", "name": "Smörgås", "optionName": "Alt 1"});
        let entry = entry_processor(date(), 1, &raw).unwrap().unwrap();
        assert_eq!(entry.meal.as_deref(), Some("Kvällsmat"));
        assert_eq!(entry.label.as_deref(), Some("Alt 1"));
    }

    #[test]
    fn test_missing_fields_fail() {
        assert!(entry_processor(date(), 1, &json!({"name": "x"})).is_err());
    }
}
