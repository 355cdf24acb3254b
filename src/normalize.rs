//! Field-alias normalization shared by every resolver.
//!
//! Remote records and fallback records name the same fields differently
//! (`_id`/`id`/`slug`, `name`/`title`, `logo`/`image`/`icon`, ...). Everything
//! that turns a raw JSON record into a model value goes through this module so
//! both sources produce identical shapes.

use crate::models::{Article, Category, MonthBucket, PageMeta, Subcategory};
use crate::utils::{resolve_asset_url, slugify_title};
use serde_json::Value;
use url::Url;

pub const CATEGORY_ID_FIELDS: &[&str] = &["_id", "id", "slug"];
pub const TILE_ID_FIELDS: &[&str] = &["_id", "id", "key", "path"];
/// Keys a subcategory may be matched by when looking up its metadata.
pub const TILE_MATCH_FIELDS: &[&str] = &["_id", "id", "slug", "key"];
pub const ARTICLE_ID_FIELDS: &[&str] = &["_id", "id"];

pub const DEFAULT_CATEGORY_LOGO: &str = "/images/placeholder.png";
pub const DEFAULT_TILE_LOGO: &str = "/images/default-hero.png";

/// Return the first of `fields` that holds a non-empty string or a number.
///
/// Numbers are rendered in their JSON form, so `{"id": 7}` yields `"7"`.
pub fn normalize_identifier(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Like [`normalize_identifier`] but for free text, where numbers are not
/// expected and an empty string counts as missing.
pub fn first_text(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

fn first_count(record: &Value, fields: &[&str]) -> Option<u64> {
    fields.iter().find_map(|field| record.get(*field)?.as_u64())
}

/// True when `record` matches `id` under any of `fields`, ignoring case.
pub fn identifier_matches(record: &Value, fields: &[&str], id: &str) -> bool {
    fields.iter().any(|field| match record.get(*field) {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(id),
        Some(Value::Number(n)) => n.to_string().eq_ignore_ascii_case(id),
        _ => false,
    })
}

/// View a collection that may be either a JSON array or an id-keyed object.
pub fn collection_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

/// Normalize a raw category record; `index` backs the generated id.
pub fn normalize_category(record: &Value, index: usize, asset_base: Option<&Url>) -> Category {
    let id = normalize_identifier(record, CATEGORY_ID_FIELDS)
        .or_else(|| normalize_identifier(record, &["key"]))
        .unwrap_or_else(|| format!("cat_{index}"));
    let logo = first_text(record, &["logo", "image", "icon", "hero"])
        .unwrap_or_else(|| DEFAULT_CATEGORY_LOGO.to_string());
    Category {
        title: first_text(record, &["title", "name", "label"]).unwrap_or_default(),
        logo: resolve_asset_url(asset_base, &logo),
        description: first_text(record, &["description", "excerpt"]).unwrap_or_default(),
        id,
    }
}

/// Normalize a raw subcategory tile belonging to `category_id`.
///
/// `fallback_logo` is used when the tile carries no image of its own.
pub fn normalize_tile(
    record: &Value,
    category_id: &str,
    fallback_logo: Option<&str>,
    asset_base: Option<&Url>,
) -> Subcategory {
    let title = first_text(record, &["title", "name"]).unwrap_or_default();
    let id = normalize_identifier(record, TILE_ID_FIELDS).unwrap_or_else(|| slugify_title(&title));
    let logo = first_text(record, &["logo", "hero"])
        .or_else(|| fallback_logo.filter(|l| !l.is_empty()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TILE_LOGO.to_string());
    let count = first_count(record, &["count", "itemCount"])
        .or_else(|| record.get("articles").map(|a| collection_items(a).len() as u64))
        .unwrap_or(0);
    Subcategory {
        id,
        category_id: category_id.to_string(),
        description: first_text(record, &["description", "excerpt"]).unwrap_or_default(),
        logo: resolve_asset_url(asset_base, &logo),
        title,
        count,
    }
}

/// Normalize a raw article of subcategory `sub_id`.
///
/// The language tag is read from `language` or `lang` and left unset when
/// neither is present; filtering decides what an untagged article means.
pub fn normalize_article(record: &Value, sub_id: &str) -> Article {
    Article {
        id: normalize_identifier(record, ARTICLE_ID_FIELDS).unwrap_or_default(),
        subcategory_id: normalize_identifier(record, &["subcategoryId", "subId"])
            .unwrap_or_else(|| sub_id.to_string()),
        title: first_text(record, &["title"]).unwrap_or_default(),
        excerpt: first_text(record, &["excerpt"]).unwrap_or_default(),
        body: first_text(record, &["body"]).unwrap_or_default(),
        date: first_text(record, &["date"]).unwrap_or_default(),
        image: first_text(record, &["image"]).unwrap_or_default(),
        scope: first_text(record, &["scope"]).unwrap_or_default(),
        language: first_text(record, &["language", "lang"]),
    }
}

/// Normalize a remote month bucket; records without a key are dropped.
pub fn normalize_month(record: &Value) -> Option<MonthBucket> {
    let key = first_text(record, &["key"])?;
    Some(MonthBucket {
        label: first_text(record, &["label"]).unwrap_or_else(|| key.clone()),
        count: first_count(record, &["count"]).unwrap_or(0),
        key,
    })
}

/// Read remote paging metadata, filling gaps from the request.
pub fn normalize_meta(record: Option<&Value>, fallback: PageMeta) -> PageMeta {
    let Some(record) = record.filter(|r| r.is_object()) else {
        return fallback;
    };
    let read_u32 = |field: &str| {
        record
            .get(field)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };
    PageMeta {
        total: record.get("total").and_then(Value::as_u64).unwrap_or(fallback.total),
        page: read_u32("page").filter(|p| *p >= 1).unwrap_or(fallback.page),
        limit: read_u32("limit").filter(|l| *l >= 1).unwrap_or(fallback.limit),
    }
}
