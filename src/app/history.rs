use crate::app::menu::Menu;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days of history kept before pruning.
pub const CALENDAR_HISTORY_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub summary: String,
    pub menu: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDay {
    date: NaiveDate,
    summary: String,
    #[serde(default)]
    menu: String,
}

/// Rolling per-source record of what was served each day, used to backfill
/// past days once the provider no longer returns them.
#[derive(Debug, Default)]
pub struct DayHistory {
    days: BTreeMap<NaiveDate, DayRecord>,
    dirty: bool,
}

impl DayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file is an empty history.
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        if !storage.exists(path) {
            tracing::debug!("No history at {}, starting empty", path);
            return Ok(Self::new());
        }

        let bytes = storage.read_file(path).await?;
        let stored: Vec<StoredDay> = serde_json::from_slice(&bytes)?;
        let days = stored
            .into_iter()
            .filter(|d| !d.summary.is_empty())
            .map(|d| {
                (
                    d.date,
                    DayRecord {
                        summary: d.summary,
                        menu: d.menu,
                    },
                )
            })
            .collect();

        Ok(Self { days, dirty: false })
    }

    /// Write to `path` if anything changed since the last load/save.
    /// Returns whether a write happened.
    pub async fn save<S: Storage>(&mut self, storage: &S, path: &str) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        let stored: Vec<StoredDay> = self
            .days
            .iter()
            .map(|(date, record)| StoredDay {
                date: *date,
                summary: record.summary.clone(),
                menu: record.menu.clone(),
            })
            .collect();
        let json = serde_json::to_vec_pretty(&stored)?;
        storage.write_file(path, &json).await?;

        self.dirty = false;
        tracing::debug!("Saved {} history day(s) to {}", self.days.len(), path);
        Ok(true)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    /// Store `record` for `date`. Empty summaries are ignored.
    pub fn record(&mut self, date: NaiveDate, record: DayRecord) -> bool {
        if record.summary.is_empty() || self.days.get(&date) == Some(&record) {
            return false;
        }
        self.days.insert(date, record);
        self.dirty = true;
        true
    }

    /// Record what `menu` serves on `date`, if it has that day.
    pub fn record_menu(&mut self, menu: &Menu, date: NaiveDate) -> bool {
        let record = DayRecord {
            summary: menu.get_readable_day_summary(date, true),
            menu: menu.get_readable_day_menu(date),
        };
        self.record(date, record)
    }

    /// Drop days older than [`CALENDAR_HISTORY_DAYS`] before `today`.
    pub fn prune(&mut self, today: NaiveDate) -> usize {
        let cutoff = today - Duration::days(CALENDAR_HISTORY_DAYS);
        let before = self.days.len();
        self.days.retain(|date, _| *date >= cutoff);
        let removed = before - self.days.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Days strictly before `today`, oldest first.
    pub fn past_days(&self, today: NaiveDate) -> impl Iterator<Item = (NaiveDate, &DayRecord)> {
        self.days.range(..today).map(|(d, r)| (*d, r))
    }
}
