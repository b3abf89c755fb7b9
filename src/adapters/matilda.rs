use crate::adapters::fetch_text;
use crate::adapters::markup::embedded_json;
use crate::core::normalize::normalize_value;
use crate::domain::model::{MenuEntry, RawCourse, RawDay};
use crate::domain::ports::MenuProvider;
use crate::utils::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;

const NAME: &str = "matildaplatform.com";
const DAYS_FETCHED: i64 = 14;

/// Matilda menu pages (Next.js). The meals live in the `__NEXT_DATA__`
/// script under `props.pageProps.meals`; every course is handed on with its
/// meal's name injected as `mealName`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatildaProvider;

/// Page URL covering this week and the next.
pub fn range_url(url: &str, today: NaiveDate) -> String {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let end = start + Duration::days(DAYS_FETCHED - 1);
    format!(
        "{}?startDate={}&endDate={}",
        url,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn parse_page(page: &str) -> Result<Vec<RawDay>> {
    let next_data = embedded_json(NAME, page, "__NEXT_DATA__")?;
    parse_meals(&next_data["props"]["pageProps"]["meals"])
}

pub fn parse_meals(meals: &Value) -> Result<Vec<RawDay>> {
    let meals = meals
        .as_array()
        .ok_or_else(|| MenuError::parse(NAME, "pageProps.meals missing"))?;

    let mut by_date: BTreeMap<NaiveDate, Vec<RawCourse>> = BTreeMap::new();
    for meal in meals {
        let raw_date = meal["date"].as_str().unwrap_or("");
        let date = raw_date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| MenuError::parse(NAME, format!("bad meal date '{}'", raw_date)))?;

        let meal_name = meal["name"].clone();
        let courses = by_date.entry(date).or_default();
        for course in meal["courses"].as_array().into_iter().flatten() {
            let mut course = course.clone();
            if let Value::Object(fields) = &mut course {
                fields.insert("mealName".to_string(), meal_name.clone());
            }
            courses.push(course);
        }
    }

    Ok(by_date
        .into_iter()
        .map(|(date, courses)| RawDay::new(date, courses))
        .collect())
}

#[async_trait]
impl MenuProvider for MatildaProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fix_url(&self, url: &str) -> String {
        url.split('?').next().unwrap_or(url).to_string()
    }

    async fn fetch_days(&self, client: &Client, url: &str, today: NaiveDate) -> Result<Vec<RawDay>> {
        let page = fetch_text(client, NAME, &range_url(url, today)).await?;
        parse_page(&page)
    }

    fn default_entry(&self, _date: NaiveDate, order: usize, raw: &RawCourse) -> MenuEntry {
        let label = Some(normalize_value(&raw["optionName"])).filter(|l| !l.is_empty());
        MenuEntry::create(
            order,
            raw["mealName"].as_str(),
            raw["name"].as_str().unwrap_or(""),
            label,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_fix_url_drops_query() {
        assert_eq!(
            MatildaProvider.fix_url("https://menu.matildaplatform.com/meals/week/63fc_skolor?startDate=x"),
            "https://menu.matildaplatform.com/meals/week/63fc_skolor"
        );
    }

    #[test]
    fn test_range_url_covers_two_weeks_from_monday() {
        assert_eq!(
            range_url("https://m/meals/week/x", date("2026-01-08")),
            "https://m/meals/week/x?startDate=2026-01-05&endDate=2026-01-18"
        );
    }

    #[test]
    fn test_parse_page_injects_meal_name() {
        let next_data = json!({
            "props": {"pageProps": {"meals": [
                {"date": "2026-01-05T00:00:00", "name": "Lunch", "courses": [
                    {"name": "Kålpudding, sås", "optionName": ""},
                    {"name": "Fiskgryta", "optionName": "Fisk"}
                ]},
                {"date": "2026-01-05T00:00:00", "name": "Kvällsmat", "courses": [
                    {"name": "Smörgås", "optionName": null}
                ]},
                {"date": "2026-01-06T00:00:00", "name": "Lunch", "courses": []}
            ]}}
        });
        let page = format!(
            r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#,
            next_data
        );

        let days = parse_page(&page).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].courses.len(), 3);
        assert_eq!(days[0].courses[2]["mealName"], "Kvällsmat");
        assert!(days[1].courses.is_empty());

        let first = MatildaProvider.default_entry(days[0].date, 1, &days[0].courses[0]);
        assert_eq!(first.meal.as_deref(), Some("Lunch"));
        assert!(first.label.is_none());
        let second = MatildaProvider.default_entry(days[0].date, 2, &days[0].courses[1]);
        assert_eq!(second.label.as_deref(), Some("Fisk"));
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let meals = json!([{"date": "soon", "name": "Lunch", "courses": []}]);
        assert!(matches!(parse_meals(&meals), Err(MenuError::ParseError { .. })));
    }
}
