//! Skutehagens skola (skolmaten.se). Courses are plain strings with the
//! diet tag in parentheses, e.g. `"Pasta med vegosås (Vegetarisk)"`.

use crate::core::normalize::normalize;
use crate::domain::model::{MenuEntry, RawCourse};
use crate::utils::error::ProcessorError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("label pattern"));

pub fn entry_processor(
    _date: NaiveDate,
    order: usize,
    raw: &RawCourse,
) -> Result<Option<MenuEntry>, ProcessorError> {
    let Some(text) = raw.as_str() else {
        // not a string: discard
        return Ok(Some(MenuEntry::create(order, Some("Lunch"), "", None)));
    };

    let entry = match LABEL_RE.captures(text) {
        Some(caps) => {
            let label = normalize(&caps[1]);
            let dish = LABEL_RE.replace_all(text, "");
            MenuEntry::create(
                order,
                Some("Lunch"),
                dish.trim(),
                Some(label).filter(|l| !l.is_empty()),
            )
        }
        None => MenuEntry::create(order, Some("Lunch"), text, None),
    };
    Ok(Some(entry))
}
