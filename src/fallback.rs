//! The embedded current affairs dataset served when the remote source is unusable.
//!
//! The dataset ships inside the binary (`data/current_affairs.json`) and keeps
//! the raw record shape, so fallback records go through the exact same
//! normalization as remote ones. Layout:
//!
//! ```text
//! {
//!   "categories": [ { "key", "title", "logo", "description" }, ... ],
//!   "subcategories": {
//!     "<categoryKey>": { "title", "hero", "logo", "tiles": [ { "id", ..., "articles": [...] } ] }
//!   }
//! }
//! ```
//!
//! `tiles` and `articles` may be arrays or id-keyed maps. Every lookup is
//! case-insensitive on its key.

use crate::normalize::{TILE_MATCH_FIELDS, collection_items, identifier_matches};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

const EMBEDDED_JSON: &str = include_str!("../data/current_affairs.json");

static EMBEDDED: Lazy<Arc<FallbackDataset>> = Lazy::new(|| {
    let dataset = FallbackDataset::from_json(EMBEDDED_JSON).unwrap_or_else(|e| {
        error!(error = %e, "Embedded fallback dataset is not valid JSON; serving an empty one");
        FallbackDataset::empty()
    });
    Arc::new(dataset)
});

/// Read-only view over a hierarchical categories → tiles → articles document.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackDataset {
    root: Value,
}

impl FallbackDataset {
    /// The dataset compiled into the crate.
    pub fn embedded() -> Arc<Self> {
        Arc::clone(&EMBEDDED)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self::from_value)
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self { root: Value::Null }
    }

    /// Top-level category records in dataset order.
    pub fn categories(&self) -> Vec<&Value> {
        self.root.get("categories").map(collection_items).unwrap_or_default()
    }

    /// The category record listed under `key`.
    pub fn category(&self, key: &str) -> Option<&Value> {
        self.categories()
            .into_iter()
            .find(|c| identifier_matches(c, &["key", "_id", "id", "slug"], key))
    }

    /// The landing record (title, hero, tiles) of `key`.
    pub fn landing(&self, key: &str) -> Option<&Value> {
        let Value::Object(map) = self.root.get("subcategories")? else {
            return None;
        };
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn tiles(&self, key: &str) -> Vec<&Value> {
        self.landing(key)
            .and_then(|l| l.get("tiles").or_else(|| l.get("subcategories")))
            .map(collection_items)
            .unwrap_or_default()
    }

    pub fn tile(&self, key: &str, sub_id: &str) -> Option<&Value> {
        self.tiles(key)
            .into_iter()
            .find(|t| identifier_matches(t, TILE_MATCH_FIELDS, sub_id))
    }

    /// Every article of a subcategory, unfiltered and in dataset order.
    pub fn articles(&self, key: &str, sub_id: &str) -> Vec<&Value> {
        self.tile(key, sub_id)
            .and_then(|t| t.get("articles"))
            .map(collection_items)
            .unwrap_or_default()
    }

    pub fn article(&self, key: &str, sub_id: &str, article_id: &str) -> Option<&Value> {
        self.articles(key, sub_id)
            .into_iter()
            .find(|a| identifier_matches(a, &["_id", "id"], article_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_dataset_parses() {
        FallbackDataset::from_json(EMBEDDED_JSON).expect("embedded dataset must be valid JSON");
        let dataset = FallbackDataset::embedded();
        assert_eq!(dataset.categories().len(), 11);
    }

    #[test]
    fn test_lookups_are_case_insensitive() {
        let dataset = FallbackDataset::embedded();
        assert!(dataset.category("UPSC").is_some());
        assert!(dataset.landing("Upsc").is_some());
        assert!(dataset.tile("upsc", "DAILY").is_some());
        assert!(!dataset.articles("UPSC", "Daily").is_empty());
    }

    #[test]
    fn test_map_shaped_tiles_and_articles() {
        let dataset = FallbackDataset::embedded();
        assert_eq!(dataset.tiles("appsc").len(), 1);
        assert_eq!(dataset.articles("appsc", "state").len(), 2);
        assert!(dataset.article("appsc", "state", "appsc-state-002").is_some());
    }

    #[test]
    fn test_missing_entries_degrade_to_empty() {
        let dataset = FallbackDataset::embedded();
        assert!(dataset.landing("nope").is_none());
        assert!(dataset.tiles("railways").is_empty());
        assert!(dataset.articles("upsc", "nope").is_empty());
        assert!(dataset.article("upsc", "daily", "nope").is_none());

        let empty = FallbackDataset::empty();
        assert!(empty.categories().is_empty());
        assert!(empty.landing("upsc").is_none());
    }

    #[test]
    fn test_article_lookup_accepts_underscore_id() {
        let dataset = FallbackDataset::from_value(json!({
            "subcategories": {"x": {"tiles": [{"id": "t", "articles": [{"_id": "A1"}]}]}}
        }));
        assert!(dataset.article("x", "t", "a1").is_some());
    }
}
