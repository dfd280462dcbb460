//! Human-facing formatting of search results.

use chrono::{DateTime, NaiveDateTime, Utc};
use url::Url;

use researchpress_shared::SearchResult;

/// Placeholder for URLs without a parseable host.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Placeholder for missing or unparseable publication dates.
pub const UNKNOWN_TIME: &str = "Unknown time";

/// Host of `url` without a leading `www.`.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Parse a backend publication date, assuming UTC when no offset is given.
pub fn parse_published(published: &str) -> Option<DateTime<Utc>> {
    let published = published.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(published) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(published.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Relative age such as "about 3 hours ago".
///
/// Future dates and anything under a minute read "just now".
pub fn format_time_ago(published: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(published) = published.and_then(parse_published) else {
        return UNKNOWN_TIME.to_string();
    };

    let elapsed = now.signed_duration_since(published);
    let (days, hours, minutes) = (elapsed.num_days(), elapsed.num_hours(), elapsed.num_minutes());

    if days >= 1 {
        plural_ago(days, "day")
    } else if hours >= 1 {
        plural_ago(hours, "hour")
    } else if minutes >= 1 {
        plural_ago(minutes, "minute")
    } else {
        "just now".to_string()
    }
}

fn plural_ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("about 1 {unit} ago")
    } else {
        format!("about {n} {unit}s ago")
    }
}

/// Title for listing, falling back to `Untitled ({url})`.
pub fn display_title(result: &SearchResult) -> String {
    match result.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => format!("Untitled ({})", result.url),
    }
}
