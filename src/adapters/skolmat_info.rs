use crate::adapters::fetch_text;
use crate::adapters::markup::strip_tags;
use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::domain::ports::MenuProvider;
use crate::utils::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::LazyLock;

const NAME: &str = "skolmat.info";

static DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<time[^>]*\bdatetime="(\d{4}-\d{2}-\d{2})""#).expect("day pattern")
});
static COURSE_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<p\b[^>]*>(.*?)</p>|<span\b[^>]*>(.*?)</span>").expect("course pattern")
});

/// Server rendered skolmat.info week page. Each day starts at a
/// `<time datetime>` element; every `<p>` after it is a dish and the
/// `<span>`s that follow a dish are its tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkolmatInfoProvider;

pub fn parse_page(page: &str) -> Result<Vec<RawDay>> {
    let starts: Vec<(usize, &str)> = DAY_RE
        .captures_iter(page)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let date = caps.get(1)?;
            Some((whole.end(), date.as_str()))
        })
        .collect();

    let mut days = Vec::with_capacity(starts.len());
    for (idx, (start, raw_date)) in starts.iter().enumerate() {
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| MenuError::parse(NAME, format!("bad date '{}': {}", raw_date, e)))?;
        let end = starts.get(idx + 1).map(|(s, _)| *s).unwrap_or(page.len());
        days.push(RawDay::new(date, parse_day(&page[*start..end])));
    }
    Ok(days)
}

fn parse_day(section: &str) -> Vec<RawCourse> {
    let mut courses: Vec<(String, Vec<String>)> = Vec::new();

    for caps in COURSE_PART_RE.captures_iter(section) {
        if let Some(dish) = caps.get(1) {
            courses.push((strip_tags(dish.as_str()), Vec::new()));
        } else if let Some(tag) = caps.get(2) {
            let tag = strip_tags(tag.as_str());
            if let Some((_, tags)) = courses.last_mut() {
                if !tag.is_empty() {
                    tags.push(tag);
                }
            }
        }
    }

    courses
        .into_iter()
        .map(|(dish, tags)| json!({"dish": dish, "tags": tags}))
        .collect()
}

#[async_trait]
impl MenuProvider for SkolmatInfoProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fix_url(&self, url: &str) -> String {
        url.to_string()
    }

    async fn fetch_days(&self, client: &Client, url: &str, _today: NaiveDate) -> Result<Vec<RawDay>> {
        let page = fetch_text(client, NAME, url).await?;
        parse_page(&page)
    }

    fn default_entry(&self, _date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry {
        let tags: Vec<&str> = raw["tags"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        let label = (!tags.is_empty()).then(|| tags.join(", "));
        MenuEntry::create(order, Some("Lunch"), raw["dish"].as_str().unwrap_or(""), label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::build_menu_data;

    const SAMPLE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="sv-se">
<body>
<main class="grow">
    <div class="space-y-10">
        <div class="flex items-start gap-x-4 sm:gap-x-8">
            <div class="w-28 sm:w-36 shrink-0">
                <time datetime="2026-02-02">2026-02-02</time>
            </div>
            <div class="space-y-3">
                <div class="space-y-2">
                    <div class="prose max-w-none">
                        <p>Spaghetti Baljonese serveras med ketchup</p>
                    </div>
                    <div class="flex flex-wrap items-center gap-3 mt-2">
                        <span class="text-sm text-neutral-700">Vegetariskt</span>
                    </div>
                </div>
                <div class="space-y-2">
                    <div class="prose max-w-none">
                        <p>Speghetti Bolognese serveras med ketchup</p>
                    </div>
                    <div class="flex flex-wrap items-center gap-3 mt-2">
                        <span class="text-sm text-neutral-700">Nötkött</span>
                        <span class="text-sm text-neutral-700">Griskött</span>
                    </div>
                </div>
            </div>
        </div>
        <div class="flex items-start gap-x-4 sm:gap-x-8">
            <div class="w-28 sm:w-36 shrink-0">
                <time datetime="2026-02-03">2026-02-03</time>
            </div>
            <div class="space-y-3">
                <div class="space-y-2">
                    <div class="prose max-w-none">
                        <p>Fiskburgare med bröd, klyftpotatis och örtaioli</p>
                    </div>
                    <div class="flex flex-wrap items-center gap-3 mt-2">
                        <span class="text-sm text-neutral-700">Fisk</span>
                    </div>
                </div>
            </div>
        </div>
    </div>
</main>
</body>
</html>
"#;

    #[test]
    fn test_parse_week_html() {
        let days = parse_page(SAMPLE_HTML).unwrap();
        let data = build_menu_data(&SkolmatInfoProvider, None, days);

        let dates: Vec<String> = data.dates().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2026-02-02", "2026-02-03"]);

        let day1 = data.day(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
        assert_eq!(day1.len(), 2);
        assert_eq!(day1[0].meal.as_deref(), Some("Lunch"));
        assert_eq!(day1[0].dish, "Spaghetti Baljonese serveras med ketchup");
        assert_eq!(day1[0].label.as_deref(), Some("Vegetariskt"));
        assert_eq!(day1[0].order, 1);
        assert_eq!(day1[1].label.as_deref(), Some("Nötkött, Griskött"));
        assert_eq!(day1[1].order, 2);

        let day2 = data.day(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(day2.len(), 1);
        assert_eq!(day2[0].dish, "Fiskburgare med bröd, klyftpotatis och örtaioli");
        assert_eq!(day2[0].label.as_deref(), Some("Fisk"));
    }

    #[test]
    fn test_page_without_days_is_empty() {
        assert!(parse_page("<html><p>Stängt</p></html>").unwrap().is_empty());
    }
}
