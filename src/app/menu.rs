//! Per-source menu controller.
//!
//! A [`Menu`] owns one provider, the last successfully fetched [`MenuData`]
//! and the failure/backoff bookkeeping. Fetches are single-flight: the fetch
//! state mutex is held across the validity check, the network round trip and
//! the commit, so concurrent callers wait and then see the fresh cache.
//!
//! The menu itself is published as an `Arc<MenuData>` snapshot that is only
//! ever replaced wholesale, so readers never need the fetch lock.

use crate::adapters::{build_menu_data, resolve_provider};
use crate::core::dayfilter::DayFilter;
use crate::core::discovery::discover_keywords;
use crate::core::render::{readable_day_menu, render_summary};
use crate::domain::model::{FilterKeywords, MenuData, MenuEntry};
use crate::domain::ports::{Clock, EntryProcessor, MenuProvider, SummaryRenderer, SystemClock};
use crate::utils::error::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

pub const DEFAULT_MENU_VALID_HOURS: u32 = 4;

const FIRST_RETRY_DELAY_MINUTES: i64 = 2;
const RETRY_STEP_MINUTES: i64 = 20;

/// Delay before the next fetch attempt after `failure_count` consecutive
/// failures: 2 minutes after the first, `failure_count * 20` minutes after
/// that.
pub fn retry_delay(failure_count: u32) -> Duration {
    if failure_count <= 1 {
        Duration::minutes(FIRST_RETRY_DELAY_MINUTES)
    } else {
        Duration::minutes(i64::from(failure_count) * RETRY_STEP_MINUTES)
    }
}

#[derive(Debug, Default, Clone)]
struct FetchState {
    last_menu_fetch: Option<NaiveDateTime>,
    failure_count: u32,
    last_fail: Option<NaiveDateTime>,
    next_allowed: Option<NaiveDateTime>,
}

impl FetchState {
    fn reset_failures(&mut self) {
        self.failure_count = 0;
        self.last_fail = None;
        self.next_allowed = None;
    }
}

/// Snapshot of the retry bookkeeping, for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStatus {
    pub last_menu_fetch: Option<NaiveDateTime>,
    pub failure_count: u32,
    pub next_allowed: Option<NaiveDateTime>,
}

pub struct Menu {
    url: String,
    provider: Box<dyn MenuProvider>,
    entry_processor: Option<EntryProcessor>,
    summary_renderer: Option<SummaryRenderer>,
    clock: Arc<dyn Clock>,
    valid_for: Duration,
    state: Mutex<FetchState>,
    menu: RwLock<Arc<MenuData>>,
    filter: RwLock<Option<Arc<DayFilter>>>,
}

impl Menu {
    /// Resolve the provider for `url` from the provider table.
    pub fn create(url: &str) -> Result<Self> {
        let provider = resolve_provider(url)?;
        Ok(Self::with_provider(provider, url))
    }

    pub fn with_provider(provider: Box<dyn MenuProvider>, url: &str) -> Self {
        let url = provider.fix_url(url.trim_end_matches([' ', '/']));
        Self {
            url,
            provider,
            entry_processor: None,
            summary_renderer: None,
            clock: Arc::new(SystemClock),
            valid_for: Duration::hours(i64::from(DEFAULT_MENU_VALID_HOURS)),
            state: Mutex::new(FetchState::default()),
            menu: RwLock::new(Arc::new(MenuData::new())),
            filter: RwLock::new(None),
        }
    }

    pub fn with_entry_processor(mut self, processor: EntryProcessor) -> Self {
        self.entry_processor = Some(processor);
        self
    }

    pub fn with_summary_renderer(mut self, renderer: SummaryRenderer) -> Self {
        self.summary_renderer = Some(renderer);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_valid_hours(mut self, hours: u32) -> Self {
        self.valid_for = Duration::hours(i64::from(hours));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Current menu snapshot, valid or not.
    pub fn menu_data(&self) -> Arc<MenuData> {
        Arc::clone(&self.menu.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the cached menu without touching the fetch bookkeeping.
    pub fn set_menu_data(&self, data: MenuData) {
        self.publish(Arc::new(data));
    }

    fn publish(&self, data: Arc<MenuData>) {
        *self.menu.write().unwrap_or_else(PoisonError::into_inner) = data;
    }

    pub async fn fetch_status(&self) -> FetchStatus {
        let state = self.state.lock().await;
        FetchStatus {
            last_menu_fetch: state.last_menu_fetch,
            failure_count: state.failure_count,
            next_allowed: state.next_allowed,
        }
    }

    pub async fn is_menu_valid(&self) -> bool {
        let state = self.state.lock().await;
        self.is_valid_at(&state, self.clock.now())
    }

    fn is_valid_at(&self, state: &FetchState, now: NaiveDateTime) -> bool {
        let Some(fetched) = state.last_menu_fetch else {
            return false;
        };
        !self.menu_data().is_empty()
            && fetched.date() == now.date()
            && now - fetched < self.valid_for
    }

    /// Cached or freshly fetched menu. `None` means there is no trustworthy
    /// data: the cache is unusable and either a retry is not allowed yet or
    /// the fetch failed with nothing current left to fall back on.
    pub async fn get_menu(&self, client: &Client, force: bool) -> Option<Arc<MenuData>> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(last_fail) = state.last_fail {
            if last_fail.date() != now.date() {
                tracing::debug!(
                    "[{}] New day since last failure, clearing {} failure(s)",
                    self.provider.name(),
                    state.failure_count
                );
                state.reset_failures();
            }
        }

        if !force && state.failure_count > 0 {
            if let Some(next_allowed) = state.next_allowed {
                if now < next_allowed {
                    tracing::debug!(
                        "[{}] In backoff until {}, not fetching {}",
                        self.provider.name(),
                        next_allowed,
                        self.url
                    );
                    return self
                        .is_valid_at(&state, now)
                        .then(|| self.menu_data());
                }
            }
        }

        if !force && self.is_valid_at(&state, now) {
            return Some(self.menu_data());
        }

        match self.load_menu(client, now.date()).await {
            Ok(data) => {
                let data = Arc::new(data);
                self.publish(Arc::clone(&data));
                state.last_menu_fetch = Some(now);
                state.reset_failures();
                tracing::info!(
                    "[{}] Fetched {} day(s) from {}",
                    self.provider.name(),
                    data.len(),
                    self.url
                );
                Some(data)
            }
            Err(e) => {
                state.failure_count += 1;
                state.last_fail = Some(now);
                let next_allowed = now + retry_delay(state.failure_count);
                state.next_allowed = Some(next_allowed);

                let location = e
                    .location()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string);
                tracing::error!(
                    provider = self.provider.name(),
                    url = %self.url,
                    failure_count = state.failure_count,
                    next_allowed = %next_allowed,
                    location = %location,
                    "Menu fetch failed: {}",
                    e
                );

                self.salvage()
            }
        }
    }

    // Keep serving the previous menu while it still covers today or later.
    fn salvage(&self) -> Option<Arc<MenuData>> {
        let previous = self.menu_data();
        if previous.has_days_from(self.clock.today()) {
            tracing::warn!(
                "[{}] Serving previously fetched menu for {}",
                self.provider.name(),
                self.url
            );
            Some(previous)
        } else {
            None
        }
    }

    async fn load_menu(&self, client: &Client, today: NaiveDate) -> Result<MenuData> {
        let days = self.provider.fetch_days(client, &self.url, today).await?;
        Ok(build_menu_data(
            self.provider.as_ref(),
            self.entry_processor.as_ref(),
            days,
        ))
    }

    /// Unfiltered entries for `date`; empty when the day is absent.
    pub fn get_day_menu(&self, date: NaiveDate) -> Vec<MenuEntry> {
        self.menu_data().day(date).to_vec()
    }

    pub fn get_readable_day_menu(&self, date: NaiveDate) -> String {
        readable_day_menu(self.menu_data().day(date))
    }

    pub fn get_readable_day_summary(&self, date: NaiveDate, filtered: bool) -> String {
        let data = self.menu_data();
        let entries = data.day(date);

        let filter = filtered
            .then(|| self.filter.read().unwrap_or_else(PoisonError::into_inner).clone())
            .flatten();
        match filter {
            Some(filter) => render_summary(&filter.filter(entries), self.summary_renderer.as_ref()),
            None => render_summary(entries, self.summary_renderer.as_ref()),
        }
    }

    /// Meal and label keywords around `reference` (default: today).
    pub fn get_summary_filter_keywords(&self, reference: Option<NaiveDate>) -> FilterKeywords {
        let reference = reference.unwrap_or_else(|| self.clock.today());
        discover_keywords(&self.menu_data(), reference)
    }

    /// Rebuild the day filter from raw configuration.
    pub fn set_summary_filters(&self, raw: &Value) {
        let filter = DayFilter::new(raw);
        let filter = (!filter.config().is_noop()).then(|| Arc::new(filter));
        *self.filter.write().unwrap_or_else(PoisonError::into_inner) = filter;
    }
}

impl std::fmt::Debug for Menu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Menu")
            .field("provider", &self.provider.name())
            .field("url", &self.url)
            .field("has_entry_processor", &self.entry_processor.is_some())
            .finish_non_exhaustive()
    }
}
