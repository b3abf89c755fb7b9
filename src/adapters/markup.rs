//! Small RSS/HTML helpers shared by the adapters. Pages are scanned, not
//! DOM-parsed; RSS feeds are real XML and go through `roxmltree`.

use crate::utils::error::{MenuError, Result};
use serde_json::Value;
use std::panic::Location;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub pub_date: String,
    pub description: String,
}

/// All `<item>`s of an RSS document, in document order. Errors point at
/// the caller.
#[track_caller]
pub fn parse_rss_items(provider: &str, xml: &str) -> Result<Vec<RssItem>> {
    let location = Location::caller();
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| MenuError::parse_at(provider, format!("invalid RSS: {}", e), location))?;

    let child_text = |item: roxmltree::Node, name: &str| {
        item.children()
            .find(|n| n.has_tag_name(name))
            .and_then(|n| n.text())
            .unwrap_or("")
            .to_string()
    };

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("item"))
        .map(|item| RssItem {
            title: child_text(item, "title"),
            pub_date: child_text(item, "pubDate"),
            description: child_text(item, "description"),
        })
        .collect())
}

/// Parse the first JSON object that starts after `marker` in `page`.
/// Errors point at the caller.
#[track_caller]
pub fn embedded_json(provider: &str, page: &str, marker: &str) -> Result<Value> {
    let location = Location::caller();
    let fail = |message: String| MenuError::parse_at(provider, message, location);

    let at = page
        .find(marker)
        .ok_or_else(|| fail(format!("'{}' not found in page", marker)))?;
    let start = page[at..]
        .find('{')
        .map(|i| at + i)
        .ok_or_else(|| fail(format!("no JSON after '{}'", marker)))?;

    // the stream deserializer stops after the first value and ignores the
    // rest of the page
    serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| fail("empty embedded JSON".to_string()))?
        .map_err(|e| fail(format!("bad embedded JSON: {}", e)))
}

/// Drop everything between `<` and `>`.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rss_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel><title>Meny</title>
              <item><title>Måndag</title><pubDate>Mon, 05 Jan 2026 00:00:00 +0100</pubDate>
                <description><![CDATA[Fisk<br />Soppa]]></description></item>
              <item><title>Tisdag</title><description>Gröt&lt;br /&gt;Bröd</description></item>
            </channel></rss>"#;
        let items = parse_rss_items("test", xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Fisk<br />Soppa");
        assert_eq!(items[1].description, "Gröt<br />Bröd");
        assert_eq!(items[1].pub_date, "");
    }

    #[test]
    fn test_parse_rss_rejects_garbage() {
        assert!(matches!(
            parse_rss_items("test", "<html><body>").unwrap_err(),
            MenuError::ParseError { .. }
        ));
    }

    #[test]
    fn test_embedded_json_ignores_trailing_page() {
        let page = r#"<script>var weekData = {"Weeks": [{"n": "{"}]}; init();</script><p>x</p>"#;
        let value = embedded_json("test", page, "weekData").unwrap();
        assert_eq!(value["Weeks"][0]["n"], "{");
        assert!(embedded_json("test", page, "missing").is_err());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags(" <b>Fisk</b> med <i>sås</i> "), "Fisk med sås");
    }
}
