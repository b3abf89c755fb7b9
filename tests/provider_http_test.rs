use chrono::NaiveDate;
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;
use skolmat::adapters::processors::ProcessorRegistry;
use skolmat::adapters::{
    FoodItProvider, MashieProvider, MatildaProvider, SkolmatInfoProvider, SkolmatenProvider,
};
use skolmat::Menu;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

const SKOLMATEN_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Skutehagens skolan</title>
<item><title>Måndag</title><pubDate>Mon, 05 Jan 2026 00:00:00 +0100</pubDate>
<description>Pasta carbonara&lt;br /&gt;Pasta med vegosås (Vegetarisk)</description></item>
<item><title>Tisdag</title><pubDate>Tue, 06 Jan 2026 00:00:00 +0100</pubDate>
<description>Kycklinggryta med ris (Fågel)</description></item>
</channel></rss>"#;

#[tokio::test]
async fn test_skolmaten_fetch_with_builtin_processor() {
    let server = MockServer::start();
    let feed_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/skutehagens-skolan/rss/weeks")
            .query_param("limit", "2");
        then.status(200)
            .header("Content-Type", "application/rss+xml")
            .body(SKOLMATEN_FEED);
    });

    let processor = ProcessorRegistry::builtin()
        .lookup("skutehagens_skola", None)
        .unwrap();
    let menu = Menu::with_provider(
        Box::new(SkolmatenProvider),
        &server.url("/skutehagens-skolan/"),
    )
    .with_entry_processor(processor);

    let data = menu.get_menu(&Client::new(), false).await.unwrap();
    feed_mock.assert();

    let monday = data.day(date("2026-01-05"));
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[1].dish, "Pasta med vegosås");
    assert_eq!(monday[1].label.as_deref(), Some("Vegetarisk"));
    assert_eq!(
        menu.get_readable_day_menu(date("2026-01-06")),
        "[Lunch]\n• Fågel: Kycklinggryta med ris"
    );
}

#[tokio::test]
async fn test_http_error_enters_backoff() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(GET).path("/skolan/rss/weeks");
        then.status(503);
    });

    let menu = Menu::with_provider(Box::new(SkolmatenProvider), &server.url("/skolan"));
    let client = Client::new();

    assert!(menu.get_menu(&client, false).await.is_none());
    // second call is inside the two minute backoff and does not hit the server
    assert!(menu.get_menu(&client, false).await.is_none());
    failing.assert_hits(1);
    assert_eq!(menu.fetch_status().await.failure_count, 1);
}

#[tokio::test]
async fn test_malformed_feed_is_a_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/skolan/rss/weeks");
        then.status(200).body("<html><body>maintenance");
    });

    let menu = Menu::with_provider(Box::new(SkolmatenProvider), &server.url("/skolan"));
    assert!(menu.get_menu(&Client::new(), false).await.is_none());
    assert_eq!(menu.fetch_status().await.failure_count, 1);
}

#[tokio::test]
async fn test_foodit_fetches_each_week() {
    let server = MockServer::start();
    let week0 = server.mock(|when, then| {
        when.method(GET).path("/").query_param("w", "0");
        then.status(200).body(
            "<rss><channel><item><title>Måndag 20260105</title>\
             <description>Köttbullar:Fiskgratäng</description></item></channel></rss>",
        );
    });
    let week1 = server.mock(|when, then| {
        when.method(GET).path("/").query_param("w", "1");
        then.status(200).body(
            "<rss><channel><item><title>Måndag 20260112</title>\
             <description>Ärtsoppa</description></item></channel></rss>",
        );
    });

    let menu = Menu::with_provider(Box::new(FoodItProvider), &server.url("/?r=1&w=0&v=Week"));
    let data = menu.get_menu(&Client::new(), false).await.unwrap();

    week0.assert();
    week1.assert();
    assert_eq!(data.len(), 2);
    assert_eq!(
        menu.get_readable_day_summary(date("2026-01-05"), true),
        "Köttbullar | Fiskgratäng"
    );
    assert_eq!(data.day(date("2026-01-12"))[0].label.as_deref(), Some("Alt 1"));
}

#[tokio::test]
async fn test_mashie_rewrites_app_url() {
    let server = MockServer::start();
    // Mon 2026-01-05 00:00 in Sweden
    let week_data = json!({"Weeks": [{"Days": [{
        "DayMenuDate": 1767567600000_i64,
        "DayMenus": [
            {"MenuAlternativeName": "Lunch husman", "DayMenuName": "Fisk med citronsås"},
            {"MenuAlternativeName": "Middag 1", "DayMenuName": "Chili con carne*, ris"}
        ]
    }]}]});
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/public/menu/Sigtuna/c32fae7a");
        then.status(200)
            .body(format!("<script>var weekData = {};</script>", week_data));
    });

    let processor = ProcessorRegistry::builtin()
        .lookup("arhem_aldreboende", Some("entry_processor"))
        .unwrap();
    let menu = Menu::with_provider(Box::new(MashieProvider), &server.url("/public/app/Sigtuna/c32fae7a"))
        .with_entry_processor(processor);
    menu.get_menu(&Client::new(), false).await.unwrap();
    page_mock.assert();

    assert_eq!(
        menu.get_readable_day_menu(date("2026-01-05")),
        "[Lunch]\n• Husman: Fisk med citronsås\n\n[Middag]\n• Alt 1: Chili con carne, ris"
    );
    menu.set_summary_filters(&json!({"meal_focus": ["Middag"]}));
    assert_eq!(
        menu.get_readable_day_summary(date("2026-01-05"), true),
        "Chili con carne, ris"
    );
}

#[tokio::test]
async fn test_matilda_requests_date_range() {
    let server = MockServer::start();
    let next_data = json!({"props": {"pageProps": {"meals": [
        {"date": "2026-01-05T00:00:00", "name": "Lunch", "courses": [
            {"name": "Kålpudding, sås", "optionName": ""}
        ]},
        {"date": "2026-01-05T00:00:00", "name": "Fiskalternativ", "courses": [
            {"name": "Fiskgryta", "optionName": ""}
        ]}
    ]}}});
    let page_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/meals/week/67b8_aldreomsorg")
            .query_param_exists("startDate")
            .query_param_exists("endDate");
        then.status(200).body(format!(
            r#"<html><script id="__NEXT_DATA__" type="application/json">{}</script></html>"#,
            next_data
        ));
    });

    let processor = ProcessorRegistry::builtin()
        .lookup("karlskoga_aldreomsorg", None)
        .unwrap();
    let menu = Menu::with_provider(
        Box::new(MatildaProvider),
        &server.url("/meals/week/67b8_aldreomsorg?startDate=old"),
    )
    .with_entry_processor(processor);
    menu.get_menu(&Client::new(), false).await.unwrap();
    page_mock.assert();

    let entries = menu.get_day_menu(date("2026-01-05"));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].meal.as_deref(), Some("Lunch"));
    assert_eq!(entries[1].label.as_deref(), Some("Fiskalternativ"));
}

#[tokio::test]
async fn test_skolmat_info_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blekinge/karlskrona/lyckeby");
        then.status(200).body(
            r#"<main><div><time datetime="2026-02-03">3 feb</time></div>
               <div><p>Fiskburgare med bröd</p><span>Fisk</span></div></main>"#,
        );
    });

    let menu = Menu::with_provider(
        Box::new(SkolmatInfoProvider),
        &server.url("/blekinge/karlskrona/lyckeby"),
    );
    menu.get_menu(&Client::new(), false).await.unwrap();

    let keywords = menu.get_summary_filter_keywords(Some(date("2026-02-01")));
    assert_eq!(keywords.meals, vec!["Lunch"]);
    assert_eq!(keywords.labels, vec!["Fisk"]);
}
