//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use url::Url;

/// Keep at most `max_chars` characters, cutting on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Drop the query string from an href
pub fn strip_query(href: &str) -> &str {
    href.split('?').next().unwrap_or(href)
}

/// Resolve an href against the site origin, leaving absolute URLs untouched
pub fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }

    match Url::parse(origin).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{href}", origin.trim_end_matches('/')),
    }
}
