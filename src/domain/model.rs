use crate::core::normalize::{normalize, normalize_opt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider-specific course payload, handed untouched to entry processors.
pub type RawCourse = serde_json::Value;

/// One course of one day, as emitted by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub meal: Option<String>,
    pub dish: String,
    pub label: Option<String>,
    pub order: usize,
}

impl MenuEntry {
    /// Build an entry from raw provider text. Meal and dish are normalized,
    /// the label is kept as given. The result may have an empty dish; such
    /// entries are dropped by [`MenuData::add_entry`].
    pub fn create(
        order: usize,
        meal_raw: Option<&str>,
        dish_raw: &str,
        label: Option<String>,
    ) -> Self {
        let meal = Some(normalize_opt(meal_raw)).filter(|m| !m.is_empty());
        Self {
            meal,
            dish: normalize(dish_raw),
            label: label.filter(|l| !l.trim().is_empty()),
            order,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.dish.is_empty()
    }

    /// `"{label} {dish}"`, the text that filter patterns are matched against.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.label.as_deref().unwrap_or(""), self.dish)
    }
}

/// Courses per calendar day. A date is only present when it has at least one
/// valid entry; entries keep provider emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MenuData {
    days: BTreeMap<NaiveDate, Vec<MenuEntry>>,
}

impl MenuData {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only way entries enter a `MenuData`. Entries without a dish are
    /// ignored. Returns whether the entry was stored.
    pub fn add_entry(&mut self, date: NaiveDate, entry: MenuEntry) -> bool {
        if !entry.is_valid() {
            return false;
        }
        self.days.entry(date).or_default().push(entry);
        true
    }

    pub fn day(&self, date: NaiveDate) -> &[MenuEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_day(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of days with entries.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn dates(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, &[MenuEntry])> + '_ {
        self.days.iter().map(|(d, e)| (*d, e.as_slice()))
    }

    /// True when any day on or after `today` is present.
    pub fn has_days_from(&self, today: NaiveDate) -> bool {
        self.days.range(today..).next().is_some()
    }
}

// Stored menus go through `add_entry` too, so empty dishes and empty days
// never survive a round trip through JSON.
impl<'de> Deserialize<'de> for MenuData {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<NaiveDate, Vec<MenuEntry>>::deserialize(deserializer)?;
        let mut data = MenuData::new();
        for (date, entries) in raw {
            for entry in entries {
                data.add_entry(date, entry);
            }
        }
        Ok(data)
    }
}

/// Raw courses of one day, in provider order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDay {
    pub date: NaiveDate,
    pub courses: Vec<RawCourse>,
}

impl RawDay {
    pub fn new(date: NaiveDate, courses: Vec<RawCourse>) -> Self {
        Self { date, courses }
    }
}

/// Candidate filter keywords found in menu data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterKeywords {
    pub meals: Vec<String>,
    pub labels: Vec<String>,
    pub info: String,
}
