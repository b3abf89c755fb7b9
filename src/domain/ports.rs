use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::utils::error::{ProcessorError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use reqwest::Client;
use std::sync::Arc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> bool;
}

/// One upstream menu format.
#[async_trait]
pub trait MenuProvider: Send + Sync {
    /// Provider name, also used as its URL marker in logs.
    fn name(&self) -> &'static str;

    /// Rewrite the user supplied URL into the one that is fetched.
    fn fix_url(&self, url: &str) -> String;

    /// Fetch and parse the upstream payload into raw per-day courses. Must
    /// either return everything or fail; partial results are never returned.
    async fn fetch_days(&self, client: &Client, url: &str, today: NaiveDate)
        -> Result<Vec<RawDay>>;

    /// Default mapping of a raw course, used when no custom processor
    /// produced a result.
    fn default_entry(&self, date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry;
}

/// User supplied entry mapping. `Ok(None)` means "use the provider default";
/// an entry with an empty dish means "discard".
pub type EntryProcessor = Arc<
    dyn Fn(NaiveDate, usize, &RawCourse) -> std::result::Result<Option<MenuEntry>, ProcessorError>
        + Send
        + Sync,
>;

/// User supplied replacement for the default day summary.
pub type SummaryRenderer =
    Arc<dyn Fn(&[MenuEntry]) -> std::result::Result<String, ProcessorError> + Send + Sync>;

pub trait Clock: Send + Sync {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
