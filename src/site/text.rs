//! Text helpers for rendered CMS fields

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("static pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Strips HTML tags and collapses runs of whitespace
pub fn clean_content(html: &str) -> String {
    let without_tags = tag_pattern().replace_all(html, "");
    whitespace_pattern()
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Formats a CMS date as e.g. "January 5, 2024"
///
/// Accepts RFC 3339, WordPress's zone-less `2024-01-05T10:00:00` and plain
/// `2024-01-05`. Anything else yields an empty string.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => String::new(),
    }
}
