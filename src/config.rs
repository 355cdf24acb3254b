//! Runtime settings: built-in defaults, then an optional YAML file, then
//! command-line flags (see [`Settings::apply_cli`]).

use crate::catalog::DEFAULT_LANDING_CONCURRENCY;
use crate::cli::Cli;
use crate::filter::FallbackPolicy;
use crate::state::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PREFERENCES_PATH: &str = "./current_affairs_prefs.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    /// Prefix for root-relative image paths; unset keeps them root-relative.
    pub asset_base_url: Option<String>,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub landing_concurrency: usize,
    pub fallback: FallbackPolicy,
    pub preferences_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            asset_base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            landing_concurrency: DEFAULT_LANDING_CONCURRENCY,
            fallback: FallbackPolicy::default(),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
        }
    }
}

impl Settings {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Load settings from `path`, or the defaults when no path is given.
    ///
    /// A path that was asked for but cannot be read or parsed is an error.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_yaml(&raw)?;
        info!(api_base_url = %settings.api_base_url, "Loaded settings file");
        Ok(settings)
    }

    /// Overlay the values given on the command line.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.api_url {
            self.api_base_url = url.clone();
        }
        if let Some(url) = &cli.asset_url {
            self.asset_base_url = Some(url.clone());
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(path) = &cli.prefs {
            self.preferences_path = path.into();
        }
        if cli.fallback_scope_filter {
            self.fallback.scope_filter = true;
        }
        if cli.fallback_month_buckets {
            self.fallback.month_buckets = true;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Base for root-relative asset paths, if one is configured and parses.
    pub fn asset_base(&self) -> Option<Url> {
        let raw = self.asset_base_url.as_deref()?;
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(asset_base_url = %raw, error = %e, "Ignoring unparseable asset base URL");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.api_base_url, "http://localhost:3000/api");
        assert_eq!(s.timeout(), Duration::from_secs(15));
        assert_eq!(s.page_size(), 20);
        assert_eq!(s.landing_concurrency, 6);
        assert!(!s.fallback.scope_filter);
        assert!(!s.fallback.month_buckets);
        assert_eq!(s.asset_base(), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let s = Settings::from_yaml(
            "api_base_url: https://example.org/api\npage_size: 10\nfallback:\n  month_buckets: true\n",
        )
        .unwrap();
        assert_eq!(s.api_base_url, "https://example.org/api");
        assert_eq!(s.page_size, 10);
        assert!(s.fallback.month_buckets);
        assert!(!s.fallback.scope_filter);
        assert_eq!(s.timeout_secs, 15);
    }

    #[test]
    fn test_bad_yaml_is_an_error() {
        assert!(Settings::from_yaml("page_size: lots").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "current_affairs",
            "--api-url",
            "https://cli.example/api",
            "--timeout-secs",
            "3",
            "--fallback-scope-filter",
            "categories",
        ]);
        let s = Settings::from_yaml("api_base_url: https://file.example/api\nasset_base_url: https://cdn.example\n")
            .unwrap()
            .apply_cli(&cli);
        assert_eq!(s.api_base_url, "https://cli.example/api");
        assert_eq!(s.timeout_secs, 3);
        assert!(s.fallback.scope_filter);
        assert_eq!(s.asset_base().unwrap().as_str(), "https://cdn.example/");
    }

    #[tokio::test]
    async fn test_load_without_path_is_default() {
        assert_eq!(Settings::load(None).await.unwrap(), Settings::default());
        assert!(Settings::load(Some("/nonexistent/current_affairs.yaml")).await.is_err());
    }
}
