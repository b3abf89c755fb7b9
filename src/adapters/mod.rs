//! Provider adapters.
//!
//! Each provider turns its upstream payload into [`RawDay`]s; the shared
//! [`build_menu_data`] template then maps every raw course to a
//! [`MenuEntry`], trying the custom entry processor first and the
//! provider's default mapping second.

pub mod foodit;
pub mod markup;
pub mod mashie;
pub mod matilda;
pub mod processors;
pub mod skolmat_info;
pub mod skolmaten;

use crate::domain::model::{MenuData, MenuEntry, RawCourse, RawDay};
use crate::domain::ports::{EntryProcessor, MenuProvider};
use crate::utils::error::{MenuError, Result};
use chrono::NaiveDate;
use reqwest::Client;
use std::future::Future;
use std::panic::Location;

pub use foodit::FoodItProvider;
pub use mashie::MashieProvider;
pub use matilda::MatildaProvider;
pub use skolmat_info::SkolmatInfoProvider;
pub use skolmaten::SkolmatenProvider;

type ProviderFactory = fn() -> Box<dyn MenuProvider>;

// Checked in order. Mashie hosts also live under matildaplatform.com.
const PROVIDERS: &[(&str, ProviderFactory)] = &[
    ("skolmaten.se", boxed::<SkolmatenProvider>),
    ("foodit.se", boxed::<FoodItProvider>),
    ("mashie", boxed::<MashieProvider>),
    ("matildaplatform.com", boxed::<MatildaProvider>),
    ("skolmat.info", boxed::<SkolmatInfoProvider>),
];

fn boxed<P: MenuProvider + Default + 'static>() -> Box<dyn MenuProvider> {
    Box::new(P::default())
}

pub fn known_providers() -> Vec<&'static str> {
    PROVIDERS.iter().map(|(marker, _)| *marker).collect()
}

/// Pick the provider whose marker occurs in `url`.
pub fn resolve_provider(url: &str) -> Result<Box<dyn MenuProvider>> {
    let url = url.trim_end_matches([' ', '/']);
    PROVIDERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map(|(_, factory)| factory())
        .ok_or_else(|| MenuError::UnrecognizedProvider {
            url: url.to_string(),
            known: known_providers().join(", "),
        })
}

/// GET `url` and return the body. Non-2xx responses are fetch errors,
/// tagged with the location of the provider call.
#[track_caller]
pub fn fetch_text<'a>(
    client: &'a Client,
    provider: &'a str,
    url: &'a str,
) -> impl Future<Output = Result<String>> + Send + 'a {
    let location = Location::caller();
    async move {
        let fail = |message: String| MenuError::FetchError { message, location };

        tracing::debug!("[{}] GET {}", provider, url);
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(format!("{} request to {} failed: {}", provider, url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!(
                "{} returned HTTP {} for {}",
                provider, status, url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| fail(format!("{} body from {} unreadable: {}", provider, url, e)))
    }
}

/// Map one raw course to an entry: custom processor result if it gives one,
/// provider default otherwise.
pub fn process_menu_entry(
    provider: &dyn MenuProvider,
    processor: Option<&EntryProcessor>,
    date: NaiveDate,
    order: usize,
    raw: &RawCourse,
) -> MenuEntry {
    if let Some(processor) = processor {
        match processor(date, order, raw) {
            Ok(Some(entry)) => return entry,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "[{}] Entry processor failed for {} #{}: {}; using default mapping",
                    provider.name(),
                    date,
                    order,
                    e
                );
            }
        }
    }
    provider.default_entry(date, order, raw)
}

/// Build a complete [`MenuData`] from raw days. `order` is 1-based per day
/// and counts every raw course, including ones that end up discarded.
pub fn build_menu_data(
    provider: &dyn MenuProvider,
    processor: Option<&EntryProcessor>,
    days: Vec<RawDay>,
) -> MenuData {
    let mut data = MenuData::new();
    for day in days {
        for (idx, raw) in day.courses.iter().enumerate() {
            let entry = process_menu_entry(provider, processor, day.date, idx + 1, raw);
            data.add_entry(day.date, entry);
        }
    }
    data
}

/// Raw text of a course that is a plain JSON string.
pub(crate) fn course_text(raw: &RawCourse) -> &str {
    raw.as_str().unwrap_or("")
}

/// Courses for "one string per course" providers: meal `Lunch`,
/// label `Alt {order}`.
pub(crate) fn alt_lunch_entry(order: usize, raw: &RawCourse) -> MenuEntry {
    MenuEntry::create(
        order,
        Some("Lunch"),
        course_text(raw),
        Some(format!("Alt {}", order)),
    )
}
