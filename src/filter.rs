//! Source-agnostic filter and sort semantics for article lists.
//!
//! These are pure functions. The fallback branch of
//! [`crate::articles::ArticleQueryEngine`] runs them over the embedded dataset;
//! remote results arrive already filtered, sorted and paged by the service.

use crate::models::{Article, Language, MonthBucket, Subcategory};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

/// The scope filter value that places no restriction.
pub const ALL_SCOPES: &str = "All";

/// Scope tags offered as quick filters on article pages.
pub const SCOPE_FILTERS: [&str; 8] = [
    ALL_SCOPES,
    "International",
    "State News",
    "Banking",
    "Business news",
    "Books & Authors",
    "Sports",
    "Awards",
];

static MONTH_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap());

/// Optional steps the fallback branch applies on top of language filtering and
/// date ordering.
///
/// The remote service is the authority for scope search and month buckets;
/// whether the embedded dataset should emulate them is a product decision, so
/// both are switches that default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FallbackPolicy {
    /// Restrict fallback articles to the requested scope tag.
    pub scope_filter: bool,
    /// Aggregate month buckets from fallback articles and honor the month filter.
    pub month_buckets: bool,
}

/// True if the article is untagged or tagged exactly with `lang`.
pub fn matches_language(article: &Article, lang: Language) -> bool {
    match article.language.as_deref() {
        None => true,
        Some(tag) => tag == lang.code(),
    }
}

/// True if `scope` is [`ALL_SCOPES`] or exactly the article's scope.
pub fn matches_scope(article: &Article, scope: &str) -> bool {
    scope == ALL_SCOPES || article.scope == scope
}

/// True if the article was published within `month` (`YYYY-MM`).
pub fn matches_month(article: &Article, month: &str) -> bool {
    month_key_of(&article.date).is_some_and(|key| key == month)
}

/// Parse an article date.
///
/// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates and
/// `YYYY-MM-DDTHH:MM:SS` without an offset; the latter two are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Milliseconds since the epoch used for ordering; unparsable dates count as 0.
fn sort_key(article: &Article) -> i64 {
    parse_date(&article.date).map_or(0, |dt| dt.timestamp_millis())
}

/// Stable sort, newest first. Articles with unparsable dates sort as if
/// published at the Unix epoch and are never dropped.
pub fn sort_by_date_desc(articles: &mut [Article]) {
    articles.sort_by_key(|a| std::cmp::Reverse(sort_key(a)));
}

/// True for a well-formed `YYYY-MM` key.
pub fn is_month_key(key: &str) -> bool {
    MONTH_KEY.is_match(key)
}

/// The `YYYY-MM` bucket of a raw date, if it parses.
pub fn month_key_of(raw_date: &str) -> Option<String> {
    parse_date(raw_date).map(|dt| dt.format("%Y-%m").to_string())
}

/// Human label of a month key, e.g. `"2024-03"` → `"March 2024"`.
pub fn month_label(key: &str) -> Option<String> {
    if !is_month_key(key) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%B %Y").to_string())
}

/// Group articles by publication month, newest month first.
///
/// Articles with unparsable dates belong to no bucket.
pub fn aggregate_months(articles: &[Article]) -> Vec<MonthBucket> {
    articles
        .iter()
        .filter_map(|a| month_key_of(&a.date))
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .map(|(key, count)| MonthBucket {
            label: month_label(&key).unwrap_or_else(|| key.clone()),
            count: count as u64,
            key,
        })
        .collect()
}

/// Case-insensitive search over tile titles and descriptions.
///
/// A blank query keeps every tile.
pub fn filter_tiles(tiles: &[Subcategory], query: &str) -> Vec<Subcategory> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return tiles.to_vec();
    }
    tiles
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&q) || t.description.to_lowercase().contains(&q))
        .cloned()
        .collect()
}
