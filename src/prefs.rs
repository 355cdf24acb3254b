//! Persisted user preferences.
//!
//! The only preference is the content language. It is handed to
//! [`crate::state::QueryStateController`] as a plain value at construction and
//! handed back on change; writing it to disk is the caller's job, through
//! [`PreferenceStore`].

use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserPreferences {
    #[serde(rename = "bb_lang_code", default)]
    pub language: Language,
}

/// JSON file holding [`UserPreferences`] across sessions.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored preferences.
    ///
    /// A missing or unreadable file yields the defaults; preferences are never
    /// worth failing a session over.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> UserPreferences {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "No stored preferences; using defaults");
                return UserPreferences::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, "Stored preferences are invalid; using defaults");
                UserPreferences::default()
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), lang = %prefs.language))]
    pub async fn save(&self, prefs: &UserPreferences) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string(prefs)?;
        fs::write(&self.path, json).await?;
        info!("Saved preferences");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("current_affairs_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_preferences_use_the_stored_key() {
        let json = serde_json::to_string(&UserPreferences {
            language: Language::Te,
        })
        .unwrap();
        assert_eq!(json, r#"{"bb_lang_code":"te"}"#);
        let prefs: UserPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.language, Language::En);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = temp_path("prefs_roundtrip");
        let store = PreferenceStore::new(&path);
        store
            .save(&UserPreferences {
                language: Language::Hi,
            })
            .await
            .unwrap();
        assert_eq!(store.load().await.language, Language::Hi);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_file_yields_defaults() {
        let missing = PreferenceStore::new(temp_path("prefs_missing"));
        assert_eq!(missing.load().await, UserPreferences::default());

        let path = temp_path("prefs_invalid");
        std::fs::write(&path, r#"{"bb_lang_code":"fr"}"#).unwrap();
        assert_eq!(PreferenceStore::new(&path).load().await, UserPreferences::default());
        let _ = std::fs::remove_file(&path);
    }
}
