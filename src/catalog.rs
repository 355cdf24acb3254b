//! Category catalog resolution: the category list, category landings and the
//! all-categories overview.
//!
//! Each call asks the remote service first and answers from the embedded
//! [`FallbackDataset`] when the call fails or yields nothing usable. Both paths
//! go through [`crate::normalize`], so callers get identical shapes either way;
//! the [`DataSource`] attached to a [`Resolved`] value only says which one won.

use crate::api::{ContentApi, Envelope};
use crate::fallback::FallbackDataset;
use crate::models::{Category, CategoryLanding, DataSource, FallbackReason, Resolved, SubcategoryHeading};
use crate::normalize::{
    CATEGORY_ID_FIELDS, TILE_MATCH_FIELDS, collection_items, first_text, identifier_matches, normalize_category,
    normalize_identifier, normalize_tile,
};
use crate::utils::resolve_asset_url;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default number of landing fetches in flight during a batch.
pub const DEFAULT_LANDING_CONCURRENCY: usize = 6;

pub const DEFAULT_HERO: &str = "/images/currentaffairs-hero.png";

/// Resolves categories and their subcategory tiles.
#[derive(Debug)]
pub struct CategoryCatalogResolver<A> {
    api: Arc<A>,
    fallback: Arc<FallbackDataset>,
    asset_base: Option<Url>,
    concurrency: usize,
}

impl<A> Clone for CategoryCatalogResolver<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            fallback: Arc::clone(&self.fallback),
            asset_base: self.asset_base.clone(),
            concurrency: self.concurrency,
        }
    }
}

/// The tiles collection of a landing payload, under `tiles` or `subcategories`.
fn landing_tiles(payload: &Value) -> Vec<&Value> {
    payload
        .get("tiles")
        .map(collection_items)
        .filter(|tiles| !tiles.is_empty())
        .or_else(|| payload.get("subcategories").map(collection_items))
        .unwrap_or_default()
}

/// A landing payload is usable when it is an object with at least one tile.
fn usable_landing(envelope: &Envelope) -> Option<&Value> {
    envelope
        .payload()
        .filter(|p| p.is_object() && !landing_tiles(p).is_empty())
}

impl<A: ContentApi> CategoryCatalogResolver<A> {
    pub fn new(api: Arc<A>, fallback: Arc<FallbackDataset>) -> Self {
        Self {
            api,
            fallback,
            asset_base: None,
            concurrency: DEFAULT_LANDING_CONCURRENCY,
        }
    }

    /// Resolve root-relative image paths against `base`.
    pub fn with_asset_base(mut self, base: Option<Url>) -> Self {
        self.asset_base = base;
        self
    }

    /// Bound the number of landing fetches in flight during [`Self::landing_batch`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn fallback(&self) -> &FallbackDataset {
        &self.fallback
    }

    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    /// List the top-level categories.
    #[instrument(level = "info", skip_all)]
    pub async fn list_categories(&self) -> Resolved<Vec<Category>> {
        let reason = match self.api.get_categories().await {
            Ok(envelope) => match envelope.payload() {
                Some(Value::Array(records)) if !records.is_empty() => {
                    let categories = self.normalize_categories(records.iter().collect());
                    info!(count = categories.len(), "Resolved categories from remote");
                    return Resolved {
                        value: categories,
                        source: DataSource::Remote,
                    };
                }
                _ => {
                    info!("Remote returned no categories; using fallback dataset");
                    FallbackReason::Empty
                }
            },
            Err(e) => {
                warn!(error = %e, "Category list fetch failed; using fallback dataset");
                FallbackReason::Transport(e.to_string())
            }
        };

        let categories = self.normalize_categories(self.fallback.categories());
        info!(count = categories.len(), "Resolved categories from fallback");
        Resolved {
            value: categories,
            source: DataSource::Fallback(reason),
        }
    }

    fn normalize_categories(&self, records: Vec<&Value>) -> Vec<Category> {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| normalize_category(record, i, self.asset_base.as_ref()))
            .collect()
    }

    /// Resolve a category's landing: its metadata and subcategory tiles.
    ///
    /// # Arguments
    ///
    /// * `category_key` - Category identifier, matched case-insensitively
    ///
    /// # Returns
    ///
    /// The landing with its provenance. The remote answer is used when it
    /// carries at least one tile under `tiles` or `subcategories`; otherwise
    /// the fallback dataset answers. A category unknown to both sources still
    /// resolves, titled with the uppercased key, logo `/images/{key}-hero.png`
    /// and no tiles.
    #[instrument(level = "info", skip_all, fields(category_key = %category_key))]
    pub async fn get_category_landing(&self, category_key: &str) -> Resolved<CategoryLanding> {
        let key = category_key.to_lowercase();
        let reason = match self.api.get_category_landing(&key).await {
            Ok(envelope) => match usable_landing(&envelope) {
                Some(payload) => {
                    let landing = self.build_landing(&key, payload.get("category"), landing_tiles(payload));
                    info!(tiles = landing.tiles.len(), "Resolved landing from remote");
                    return Resolved {
                        value: landing,
                        source: DataSource::Remote,
                    };
                }
                None => {
                    info!("Remote landing had no tiles; using fallback dataset");
                    FallbackReason::Empty
                }
            },
            Err(e) => {
                warn!(error = %e, "Landing fetch failed; using fallback dataset");
                FallbackReason::Transport(e.to_string())
            }
        };

        let landing = self.fallback_landing(&key);
        info!(tiles = landing.tiles.len(), "Resolved landing from fallback");
        Resolved {
            value: landing,
            source: DataSource::Fallback(reason),
        }
    }

    fn fallback_landing(&self, key: &str) -> CategoryLanding {
        let meta = self.fallback_category_meta(key);
        self.build_landing(key, meta.as_ref(), self.fallback.tiles(key))
    }

    /// Merge the fallback category record with its landing record; landing
    /// fields win.
    fn fallback_category_meta(&self, key: &str) -> Option<Value> {
        let category = self.fallback.category(key);
        let landing = self.fallback.landing(key);
        if category.is_none() && landing.is_none() {
            return None;
        }
        let mut merged = serde_json::Map::new();
        for source in [category, landing].into_iter().flatten() {
            if let Value::Object(fields) = source {
                for (k, v) in fields {
                    if k != "tiles" && k != "subcategories" {
                        merged.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Some(Value::Object(merged))
    }

    fn build_landing(&self, key: &str, meta: Option<&Value>, tiles: Vec<&Value>) -> CategoryLanding {
        let empty = Value::Null;
        let meta = meta.unwrap_or(&empty);
        let raw_logo = first_text(meta, &["logo", "hero", "image"]);
        let logo = raw_logo.clone().unwrap_or_else(|| format!("/images/{key}-hero.png"));
        let category = Category {
            id: normalize_identifier(meta, CATEGORY_ID_FIELDS)
                .or_else(|| normalize_identifier(meta, &["key"]))
                .unwrap_or_else(|| key.to_string()),
            title: first_text(meta, &["title", "name", "label"]).unwrap_or_else(|| key.to_uppercase()),
            logo: resolve_asset_url(self.asset_base.as_ref(), &logo),
            description: first_text(meta, &["description", "excerpt"]).unwrap_or_default(),
        };
        let tiles = tiles
            .into_iter()
            .map(|t| normalize_tile(t, key, raw_logo.as_deref(), self.asset_base.as_ref()))
            .collect();
        CategoryLanding { category, tiles }
    }

    /// Fetch the landing of every category, at most `concurrency` at a time.
    ///
    /// # Arguments
    ///
    /// * `categories` - The rows to fill, usually from [`Self::list_categories`]
    ///
    /// # Returns
    ///
    /// One [`CategoryLanding`] per input category, in input order. Categories
    /// whose fetch fails or comes back empty keep their row with no tiles; one
    /// bad category never aborts the batch.
    #[instrument(level = "info", skip_all, fields(categories = categories.len()))]
    pub async fn landing_batch(&self, categories: &[Category]) -> Vec<CategoryLanding> {
        let this = self;
        let rows: Vec<CategoryLanding> = stream::iter(categories.iter().cloned())
            .map(move |category| async move {
                let tiles = match this.api.get_category_landing(&category.id).await {
                    Ok(envelope) => match usable_landing(&envelope) {
                        Some(payload) => landing_tiles(payload)
                            .into_iter()
                            .map(|t| {
                                normalize_tile(
                                    t,
                                    &category.id,
                                    Some(category.logo.as_str()),
                                    this.asset_base.as_ref(),
                                )
                            })
                            .collect(),
                        None => {
                            debug!(category = %category.id, "Landing had no tiles");
                            Vec::new()
                        }
                    },
                    Err(e) => {
                        warn!(category = %category.id, error = %e, "Landing fetch failed; row keeps no tiles");
                        Vec::new()
                    }
                };
                CategoryLanding { category, tiles }
            })
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        let degraded = rows.iter().filter(|r| r.tiles.is_empty()).count();
        info!(rows = rows.len(), degraded, "Resolved landing batch");
        rows
    }

    /// Every category with its tiles.
    pub async fn overview(&self) -> Vec<CategoryLanding> {
        let categories = self.list_categories().await.value;
        self.landing_batch(&categories).await
    }

    /// Display metadata for a subcategory page.
    ///
    /// Looks the tile up in the landing payload by `_id`, `id`, `slug` or `key`
    /// (case-insensitive). Missing tiles and categories fall through to
    /// defaults rather than failing.
    #[instrument(level = "info", skip_all, fields(category_key = %category_key, sub_id = %sub_id))]
    pub async fn get_subcategory_heading(&self, category_key: &str, sub_id: &str) -> SubcategoryHeading {
        let key = category_key.to_lowercase();
        let remote = match self.api.get_category_landing(&key).await {
            Ok(envelope) => envelope.payload().filter(|p| p.is_object()).cloned(),
            Err(e) => {
                warn!(error = %e, "Landing fetch for heading failed; using fallback dataset");
                None
            }
        };

        let (category, tile) = match &remote {
            Some(payload) => {
                let tile = ["tiles", "subcategories"].iter().find_map(|field| {
                    payload
                        .get(*field)
                        .map(collection_items)
                        .unwrap_or_default()
                        .into_iter()
                        .find(|t| identifier_matches(t, TILE_MATCH_FIELDS, sub_id))
                        .cloned()
                });
                (payload.get("category").cloned(), tile)
            }
            None => (
                self.fallback_category_meta(&key),
                self.fallback.tile(&key, sub_id).cloned(),
            ),
        };

        if tile.is_none() {
            debug!("No tile matched; heading uses category defaults");
        }

        let title = tile
            .as_ref()
            .and_then(|t| first_text(t, &["title", "name"]))
            .or_else(|| category.as_ref().and_then(|c| first_text(c, &["title", "name"])))
            .unwrap_or_else(|| sub_id.to_string());
        let hero = tile
            .as_ref()
            .and_then(|t| first_text(t, &["logo", "hero"]))
            .or_else(|| category.as_ref().and_then(|c| first_text(c, &["hero", "logo"])))
            .unwrap_or_else(|| DEFAULT_HERO.to_string());

        SubcategoryHeading {
            title,
            hero: resolve_asset_url(self.asset_base.as_ref(), &hero),
        }
    }
}
