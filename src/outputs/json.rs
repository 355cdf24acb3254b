//! JSON snapshot files.
//!
//! Every snapshot lands in a directory named after the local date, so repeated
//! runs on one day overwrite each other while older days are kept.

use crate::utils::{ensure_writable_dir, slugify_title};
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// File name (without extension) for a snapshot labelled `label`.
pub fn snapshot_name(label: &str) -> String {
    let slug = slugify_title(label);
    let slug: String = slug
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if slug.is_empty() { "snapshot".to_string() } else { slug }
}

/// Serialize `value` to `{json_output_dir}/{date}/{label}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, %label))]
pub async fn write_snapshot<T: Serialize>(
    value: &T,
    json_output_dir: &str,
    label: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;

    let full_json_dir = format!("{}/{}", json_output_dir, Local::now().date_naive());
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = ensure_writable_dir(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "JSON directory is not writable");
        return Err(e);
    }

    let path = PathBuf::from(&full_json_dir).join(format!("{}.json", snapshot_name(label)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON snapshot");

    Ok(path)
}
