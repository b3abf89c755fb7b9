use crate::adapters::markup::{parse_rss_items, RssItem};
use crate::adapters::{alt_lunch_entry, fetch_text};
use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::domain::ports::MenuProvider;
use crate::utils::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::sync::LazyLock;

const NAME: &str = "foodit.se";
const WEEKS: usize = 2;

static WEEK_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&w=[0-9]*&").expect("week parameter pattern"));

/// webmenu.foodit.se RSS. The feed holds one week, selected by the `w`
/// query parameter; item titles are `"<weekday> YYYYMMDD"` and courses are
/// `:` separated.
#[derive(Debug, Default, Clone, Copy)]
pub struct FoodItProvider;

/// Feed URLs for this week and the following ones. A URL without a `w`
/// parameter only ever yields the one week it points at.
pub fn week_urls(url: &str) -> Vec<String> {
    if !WEEK_PARAM_RE.is_match(url) {
        return vec![url.to_string()];
    }
    (0..WEEKS)
        .map(|week| WEEK_PARAM_RE.replace(url, format!("&w={}&", week)).into_owned())
        .collect()
}

pub fn parse_feed(xml: &str) -> Result<Vec<RawDay>> {
    parse_rss_items(NAME, xml)?
        .iter()
        .map(parse_item)
        .collect()
}

fn parse_item(item: &RssItem) -> Result<RawDay> {
    let stamp = item
        .title
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| MenuError::parse(NAME, format!("no date in title '{}'", item.title)))?;
    let date = NaiveDate::parse_from_str(stamp, "%Y%m%d")
        .map_err(|e| MenuError::parse(NAME, format!("bad date '{}': {}", stamp, e)))?;

    let courses = item
        .description
        .split(':')
        .filter(|c| !c.is_empty())
        .map(|c| Value::String(c.trim().to_string()))
        .collect();
    Ok(RawDay::new(date, courses))
}

#[async_trait]
impl MenuProvider for FoodItProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fix_url(&self, url: &str) -> String {
        if url.contains("foodit.se/rss") {
            url.to_string()
        } else {
            url.replacen("foodit.se", "foodit.se/rss", 1)
        }
    }

    async fn fetch_days(&self, client: &Client, url: &str, _today: NaiveDate) -> Result<Vec<RawDay>> {
        let mut days = Vec::new();
        for week_url in week_urls(url) {
            let feed = fetch_text(client, NAME, &week_url).await?;
            days.extend(parse_feed(&feed)?);
        }
        Ok(days)
    }

    fn default_entry(&self, _date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry {
        alt_lunch_entry(order, raw)
    }
}
