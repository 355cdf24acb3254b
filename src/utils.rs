//! Utility functions for string handling, asset URLs and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - String truncation for logging remote payload previews
//! - Slug derivation for records that arrive without an identifier
//! - Resolution of root-relative asset paths against a base URL
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Derive an identifier from a display title.
///
/// Lowercases the title and collapses every whitespace run into a single
/// underscore, so `"Daily News"` becomes `"daily_news"`.
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolve a root-relative asset path (`/images/...`) against `base`.
///
/// Absolute URLs, relative paths and empty strings are returned unchanged, as
/// is everything when no base is configured.
pub fn resolve_asset_url(base: Option<&Url>, path: &str) -> String {
    match base {
        Some(base) if path.starts_with('/') && !path.starts_with("//") => {
            format!("{}{}", base.as_str().trim_end_matches('/'), path)
        }
        _ => path.to_string(),
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
