//! Data models for the current affairs catalog and its article pages.
//!
//! This module defines the value types every resolver hands back:
//! - [`Category`], [`Subcategory`], [`CategoryLanding`]: the catalog hierarchy
//! - [`Article`], [`MonthBucket`], [`ResultEnvelope`]: one page of articles
//! - [`Language`]: the content languages the service publishes in
//!
//! All of these are rebuilt per request from either the remote service or the
//! embedded fallback dataset, and both sources produce the exact same shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content language of an article, serialized as its short code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Te,
}

impl Language {
    /// All supported languages in display order.
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Te];

    /// The wire code (`en`, `hi`, `te`).
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Te => "te",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Te => "Telugu",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            "te" => Ok(Language::Te),
            other => Err(format!("unsupported language code '{other}' (expected en, hi or te)")),
        }
    }
}

/// A top-level content grouping, such as an exam track.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    /// Identifier used in paths (`/currentaffairs/{id}`).
    pub id: String,
    pub title: String,
    /// Absolute or root-relative image URI.
    pub logo: String,
    pub description: String,
}

/// A subcategory tile within a category; articles belong to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub logo: String,
    pub description: String,
    /// Number of articles the tile advertises.
    pub count: u64,
}

/// The payload of a category landing page: the category and its tiles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryLanding {
    pub category: Category,
    pub tiles: Vec<Subcategory>,
}

/// A single current affairs article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub subcategory_id: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    /// Publication date exactly as delivered; see [`crate::filter::parse_date`].
    pub date: String,
    pub image: String,
    /// Topical tag such as "Sports" or "Banking".
    pub scope: String,
    /// Language code. `None` only while an untagged fallback record is being
    /// filtered; every article leaving a resolver carries a code.
    pub language: Option<String>,
}

impl Article {
    /// Tag untagged articles with the default language.
    pub fn with_default_language(mut self) -> Self {
        if self.language.is_none() {
            self.language = Some(Language::default().code().to_string());
        }
        self
    }
}

/// Count of articles published within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub count: u64,
}

/// Paging metadata of a [`ResultEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// One page of articles, identical in shape for remote and fallback results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResultEnvelope {
    pub articles: Vec<Article>,
    pub months: Vec<MonthBucket>,
    pub meta: PageMeta,
}

/// Display metadata for a subcategory's article page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubcategoryHeading {
    pub title: String,
    pub hero: String,
}

/// Filters of an article page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFilters {
    pub page: u32,
    pub limit: u32,
    /// `YYYY-MM`
    pub month: Option<String>,
    /// Scope tag; `None` or `"All"` means no restriction.
    pub scope: Option<String>,
    pub language: Language,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Fallback(FallbackReason),
}

/// Why a resolver served fallback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The remote call failed; carries the transport error message.
    Transport(String),
    /// The remote call succeeded but had nothing usable.
    Empty,
}

impl DataSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, DataSource::Remote)
    }

    /// The transport error that forced a fallback, if any.
    pub fn transport_error(&self) -> Option<&str> {
        match self {
            DataSource::Fallback(FallbackReason::Transport(message)) => Some(message),
            _ => None,
        }
    }
}

/// A resolved value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: DataSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(language: Option<&str>) -> Article {
        Article {
            id: "a1".to_string(),
            subcategory_id: "daily".to_string(),
            title: "Title".to_string(),
            excerpt: String::new(),
            body: String::new(),
            date: "2024-03-01".to_string(),
            image: String::new(),
            scope: "Sports".to_string(),
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_language_codes_round_trip_through_from_str() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert!("EN".parse::<Language>().is_err());
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Te).unwrap(), "\"te\"");
        let parsed: Language = serde_json::from_str("\"hi\"").unwrap();
        assert_eq!(parsed, Language::Hi);
    }

    #[test]
    fn test_with_default_language_only_fills_missing_tag() {
        assert_eq!(article(None).with_default_language().language.as_deref(), Some("en"));
        assert_eq!(article(Some("te")).with_default_language().language.as_deref(), Some("te"));
    }

    #[test]
    fn test_envelope_serializes_camel_case_articles() {
        let envelope = ResultEnvelope {
            articles: vec![article(Some("en"))],
            months: vec![],
            meta: PageMeta {
                total: 1,
                page: 1,
                limit: 20,
            },
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"subcategoryId\":\"daily\""));
        assert!(json.contains("\"meta\":{\"total\":1,\"page\":1,\"limit\":20}"));
    }

    #[test]
    fn test_data_source_transport_error() {
        let source = DataSource::Fallback(FallbackReason::Transport("timed out".to_string()));
        assert_eq!(source.transport_error(), Some("timed out"));
        assert!(!source.is_remote());
        assert_eq!(DataSource::Fallback(FallbackReason::Empty).transport_error(), None);
    }
}
