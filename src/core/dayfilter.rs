//! Three-phase day filter: meal focus, exclude/prefer, cap.
//!
//! Every phase is guarded so that a non-empty day never filters down to
//! nothing: meal focus falls back to all entries, each exclusion pattern is
//! skipped if it would remove everything that is left, and the final result
//! falls back to the focused entries.

use crate::domain::model::MenuEntry;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Reverse;

#[derive(Debug, Clone, Default)]
pub struct PatternBlock {
    pub regex: Vec<Regex>,
}

impl PatternBlock {
    pub fn is_empty(&self) -> bool {
        self.regex.is_empty()
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.regex.iter().map(Regex::as_str).collect()
    }

    fn hits(&self, text: &str) -> usize {
        self.regex.iter().filter(|rx| rx.is_match(text)).count()
    }
}

/// Normalized filter configuration, built once per configuration change.
#[derive(Debug, Clone, Default)]
pub struct DayFilterConfig {
    pub meal_focus: Option<Vec<String>>,
    pub exclude: PatternBlock,
    pub prefer: PatternBlock,
    pub max_items: Option<usize>,
}

impl DayFilterConfig {
    /// Accepts both the nested layout (`exclude.regex`, `prefer.labels`, ..)
    /// and the flat legacy keys (`exclude_regex`, `prefer_labels`, ..).
    /// Labels become escaped literal patterns. Invalid patterns are logged
    /// and dropped.
    pub fn build(raw: &Value) -> Self {
        let empty = serde_json::Map::new();
        let raw = raw.as_object().unwrap_or(&empty);

        let meal_focus = non_null(raw, "meal_focus")
            .or_else(|| non_null(raw, "meals_selected"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|meals| !meals.is_empty());

        let mut exclude = parse_block(raw.get("exclude"));
        if raw.contains_key("exclude_labels") || raw.contains_key("exclude_regex") {
            exclude = parse_parts(raw.get("exclude_labels"), raw.get("exclude_regex"));
        }

        let mut prefer = parse_block(raw.get("prefer"));
        if raw.contains_key("prefer_labels") || raw.contains_key("prefer_regex") {
            prefer = parse_parts(raw.get("prefer_labels"), raw.get("prefer_regex"));
        }

        let max_items = non_null(raw, "max_items")
            .or_else(|| non_null(raw, "max_entries"))
            .and_then(Value::as_u64)
            .filter(|n| *n >= 1)
            .and_then(|n| usize::try_from(n).ok());

        Self {
            meal_focus,
            exclude,
            prefer,
            max_items,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.meal_focus.is_none()
            && self.exclude.is_empty()
            && self.prefer.is_empty()
            && self.max_items.is_none()
    }
}

fn non_null<'a>(raw: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

fn parse_block(block: Option<&Value>) -> PatternBlock {
    match block.and_then(Value::as_object) {
        Some(obj) => parse_parts(obj.get("labels"), obj.get("regex")),
        None => PatternBlock::default(),
    }
}

fn parse_parts(labels: Option<&Value>, regex: Option<&Value>) -> PatternBlock {
    let mut block = PatternBlock::default();

    for pattern in string_items(regex) {
        if let Some(rx) = compile(pattern) {
            block.regex.push(rx);
        }
    }

    for label in string_items(labels) {
        let literal = regex::escape(&label.trim().to_lowercase());
        if let Some(rx) = compile(&literal) {
            block.regex.push(rx);
        }
    }

    block
}

fn string_items(value: Option<&Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::error!("DayFilter: invalid regex '{}' ignored ({})", pattern, e);
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DayFilter {
    config: DayFilterConfig,
}

impl DayFilter {
    pub fn new(raw: &Value) -> Self {
        Self::from_config(DayFilterConfig::build(raw))
    }

    pub fn from_config(config: DayFilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DayFilterConfig {
        &self.config
    }

    /// Filter, rank and cap one day's entries. Only returns an empty list for
    /// empty input.
    pub fn filter(&self, entries: &[MenuEntry]) -> Vec<MenuEntry> {
        if entries.is_empty() {
            return Vec::new();
        }

        let focused = self.phase_a_focus(entries);
        let ranked = self.phase_b_filter_and_rank(&focused);
        let capped = self.phase_c_cap(ranked);

        let result = if capped.is_empty() { focused } else { capped };
        result.into_iter().cloned().collect()
    }

    fn phase_a_focus<'a>(&self, entries: &'a [MenuEntry]) -> Vec<&'a MenuEntry> {
        let Some(meal_focus) = &self.config.meal_focus else {
            return entries.iter().collect();
        };

        let focused: Vec<&MenuEntry> = entries
            .iter()
            .filter(|e| e.meal.as_ref().is_some_and(|m| meal_focus.contains(m)))
            .collect();

        if focused.is_empty() {
            tracing::info!(
                "DayFilter: meal_focus {:?} matched nothing, falling back to all entries",
                meal_focus
            );
            return entries.iter().collect();
        }
        focused
    }

    fn phase_b_filter_and_rank<'a>(&self, entries: &[&'a MenuEntry]) -> Vec<&'a MenuEntry> {
        let filtered = self.apply_exclusions(entries.to_vec());
        self.apply_preferences(filtered)
    }

    fn apply_exclusions<'a>(&self, mut result: Vec<&'a MenuEntry>) -> Vec<&'a MenuEntry> {
        for rx in &self.config.exclude.regex {
            let kept: Vec<&MenuEntry> = result
                .iter()
                .copied()
                .filter(|e| !rx.is_match(&e.match_text()))
                .collect();

            if kept.is_empty() {
                tracing::info!(
                    "DayFilter: exclusion skipped (regex='{}'), would remove all entries ({})",
                    rx.as_str(),
                    result.len()
                );
            } else {
                result = kept;
            }
        }
        result
    }

    fn apply_preferences<'a>(&self, mut entries: Vec<&'a MenuEntry>) -> Vec<&'a MenuEntry> {
        let prefer = &self.config.prefer;
        if prefer.is_empty() {
            return entries;
        }

        // most hits first, ties by course order
        entries.sort_by_cached_key(|e| {
            let label = e.label.as_deref().unwrap_or("").to_lowercase();
            let text = format!("{} {}", label, e.dish.to_lowercase());
            (Reverse(prefer.hits(&text)), e.order)
        });
        entries
    }

    fn phase_c_cap<'a>(&self, mut entries: Vec<&'a MenuEntry>) -> Vec<&'a MenuEntry> {
        if let Some(max) = self.config.max_items {
            entries.truncate(max);
        }
        entries
    }
}
