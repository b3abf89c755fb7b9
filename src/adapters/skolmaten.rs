use crate::adapters::markup::{parse_rss_items, RssItem};
use crate::adapters::{alt_lunch_entry, fetch_text};
use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::domain::ports::MenuProvider;
use crate::utils::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde_json::Value;

const NAME: &str = "skolmaten.se";
const WEEKS: usize = 2;

/// skolmaten.se weekly RSS feed. One item per day, courses separated by
/// `<br />` in the description.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkolmatenProvider;

pub fn parse_feed(xml: &str) -> Result<Vec<RawDay>> {
    parse_rss_items(NAME, xml)?
        .iter()
        .map(parse_item)
        .collect()
}

fn parse_item(item: &RssItem) -> Result<RawDay> {
    let date = DateTime::parse_from_rfc2822(item.pub_date.trim())
        .map_err(|e| MenuError::parse(NAME, format!("bad pubDate '{}': {}", item.pub_date, e)))?
        .date_naive();

    let courses = item
        .description
        .split("<br />")
        .map(|c| Value::String(c.to_string()))
        .collect();
    Ok(RawDay::new(date, courses))
}

#[async_trait]
impl MenuProvider for SkolmatenProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fix_url(&self, url: &str) -> String {
        if url.contains("/rss/weeks") {
            url.to_string()
        } else {
            format!("{}/rss/weeks", url)
        }
    }

    async fn fetch_days(&self, client: &Client, url: &str, _today: NaiveDate) -> Result<Vec<RawDay>> {
        let feed = fetch_text(client, NAME, &format!("{}?limit={}", url, WEEKS)).await?;
        parse_feed(&feed)
    }

    fn default_entry(&self, _date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry {
        alt_lunch_entry(order, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Skutehagens skolan</title>
<item><title>Måndag - Vecka 2</title><pubDate>Mon, 05 Jan 2026 00:00:00 +0100</pubDate>
<description>Pasta carbonara&lt;br /&gt;Pasta med vegosås (Vegetarisk)</description></item>
<item><title>Tisdag - Vecka 2</title><pubDate>Tue, 06 Jan 2026 00:00:00 +0100</pubDate>
<description>Trettondedag jul</description></item>
</channel></rss>"#;

    #[test]
    fn test_fix_url() {
        let p = SkolmatenProvider;
        assert_eq!(
            p.fix_url("https://skolmaten.se/skutehagens-skolan"),
            "https://skolmaten.se/skutehagens-skolan/rss/weeks"
        );
        assert_eq!(
            p.fix_url("https://skolmaten.se/skutehagens-skolan/rss/weeks"),
            "https://skolmaten.se/skutehagens-skolan/rss/weeks"
        );
    }

    #[test]
    fn test_parse_feed() {
        let days = parse_feed(FEED).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(days[0].courses.len(), 2);
        assert_eq!(days[1].courses, vec![Value::from("Trettondedag jul")]);
    }

    #[test]
    fn test_default_entry_labels_by_order() {
        let entry = SkolmatenProvider.default_entry(
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            2,
            &Value::from("pasta med vegosås "),
        );
        assert_eq!(entry.meal.as_deref(), Some("Lunch"));
        assert_eq!(entry.label.as_deref(), Some("Alt 2"));
        assert_eq!(entry.dish, "Pasta med vegosås");
    }

    #[test]
    fn test_bad_pub_date_is_parse_error() {
        let feed = FEED.replace("Mon, 05 Jan 2026 00:00:00 +0100", "someday");
        assert!(matches!(parse_feed(&feed), Err(MenuError::ParseError { .. })));
    }
}
