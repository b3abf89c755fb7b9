use crate::adapters::fetch_text;
use crate::adapters::markup::embedded_json;
use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::domain::ports::MenuProvider;
use crate::utils::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Client;
use serde_json::Value;

const NAME: &str = "mashie";

/// Mashie public menu page. The page embeds a `weekData` JSON object with
/// `Weeks[].Days[]`, each day holding a millisecond `DayMenuDate` and its
/// `DayMenus[]`. Each `DayMenus` object is one raw course.
#[derive(Debug, Default, Clone, Copy)]
pub struct MashieProvider;

pub fn parse_page(page: &str) -> Result<Vec<RawDay>> {
    let week_data = embedded_json(NAME, page, "weekData")?;
    parse_week_data(&week_data)
}

pub fn parse_week_data(week_data: &Value) -> Result<Vec<RawDay>> {
    let weeks = week_data["Weeks"]
        .as_array()
        .ok_or_else(|| MenuError::parse(NAME, "weekData has no Weeks"))?;

    let mut days = Vec::new();
    for day in weeks.iter().filter_map(|w| w["Days"].as_array()).flatten() {
        let date = day_date(&day["DayMenuDate"])?;
        let courses = day["DayMenus"].as_array().cloned().unwrap_or_default();
        days.push(RawDay::new(date, courses));
    }
    Ok(days)
}

// Mashie stamps Swedish local midnight, i.e. 23:00 or 22:00 UTC the day
// before. Read at UTC+2 both land on the intended date, whatever the host zone.
const STAMP_OFFSET_SECONDS: i32 = 2 * 3600;

// Either a number or a "/Date(1767567600000)/" style string.
fn day_date(raw: &Value) -> Result<NaiveDate> {
    let millis = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    };

    let offset = FixedOffset::east_opt(STAMP_OFFSET_SECONDS)
        .ok_or_else(|| MenuError::parse(NAME, "bad stamp offset"))?;
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|utc| utc.with_timezone(&offset).date_naive())
        .ok_or_else(|| MenuError::parse(NAME, format!("bad DayMenuDate {}", raw)))
}

#[async_trait]
impl MenuProvider for MashieProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fix_url(&self, url: &str) -> String {
        url.replace("/public/app/", "/public/menu/")
    }

    async fn fetch_days(&self, client: &Client, url: &str, _today: NaiveDate) -> Result<Vec<RawDay>> {
        let page = fetch_text(client, NAME, url).await?;
        parse_page(&page)
    }

    fn default_entry(&self, _date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry {
        MenuEntry::create(
            order,
            raw["MenuAlternativeName"].as_str(),
            raw["DayMenuName"].as_str().unwrap_or(""),
            None,
        )
    }
}
