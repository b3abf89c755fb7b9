//! Dish and meal text cleanup.
//!
//! Upstream providers hand us text with HTML entities, stray whitespace,
//! allergy markers (`*`, `(A)`) and "A: " style prefixes. [`normalize`] turns
//! that into a single trimmed, capitalised line. An empty result means the
//! value should be discarded.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\p{L}: )+").expect("prefix pattern"));
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\p{L}\)").expect("marker pattern"));
static STAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").expect("star pattern"));
// a comma run with whitespace on either side, or a repeated comma; "1,5"
// is left alone
static COMMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+,[\s,]*|,[\s,]*\s|,(?:\s*,)+").expect("comma pattern")
});

// Each pass only shortens the text or fixes spacing, so this is never reached
// in practice.
const MAX_PASSES: usize = 8;

/// Clean raw dish/meal text. Deterministic and idempotent.
pub fn normalize(raw: &str) -> String {
    let mut current = clean_once(raw);
    for _ in 0..MAX_PASSES {
        let next = clean_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// [`normalize`] for optional input; `None` yields an empty string.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// [`normalize`] for a raw JSON value. Anything but a string is discarded.
pub fn normalize_value(raw: &Value) -> String {
    match raw {
        Value::String(s) => normalize(s),
        _ => String::new(),
    }
}

fn clean_once(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let decoded = decode_entities(raw);
    let text = WS_RE.replace_all(&decoded, " ");
    let text = PREFIX_RE.replace(text.trim_start(), "");
    let text = MARKER_RE.replace_all(&text, "");
    let text = STAR_RE.replace_all(&text, "");
    // marker removal can leave double spaces behind
    let text = WS_RE.replace_all(&text, " ");
    let text = COMMA_RE.replace_all(&text, ", ");
    let text = text.trim_matches(|c: char| c == ',' || c.is_whitespace());

    capitalize_first(text)
}

/// Decode HTML entities until none are left (`&amp;lt;` becomes `<`).
pub fn decode_entities(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = html_escape::decode_html_entities(&current).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
