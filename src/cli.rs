//! Command-line interface definitions.
//!
//! Connection options can also come from the environment
//! (`CURRENT_AFFAIRS_API_URL`, `BB_TOKEN`) or from a YAML settings file passed
//! with `--config`; flags win over both.

use crate::models::Language;
use clap::{Parser, Subcommand, ValueEnum};

/// Browse current affairs by category, subcategory and article.
///
/// # Examples
///
/// ```sh
/// # Every category with its tiles
/// current_affairs all
///
/// # Second page of Hindi articles for March 2024
/// current_affairs articles upsc daily --month 2024-03 --page 2 --lang hi
///
/// # Against another service, writing a JSON snapshot
/// current_affairs --api-url https://example.org/api -j ./json categories
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Base URL of the content service
    #[arg(long, env = "CURRENT_AFFAIRS_API_URL")]
    pub api_url: Option<String>,

    /// Base URL prepended to root-relative image paths
    #[arg(long)]
    pub asset_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "BB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path of the stored preferences file
    #[arg(long)]
    pub prefs: Option<String>,

    /// Apply the scope filter to offline data as well
    #[arg(long)]
    pub fallback_scope_filter: bool,

    /// Aggregate month buckets from offline data as well
    #[arg(long)]
    pub fallback_month_buckets: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the result as JSON into this directory
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all categories
    Categories,

    /// Show one category and its subcategory tiles
    Landing {
        category: String,

        /// Only show tiles whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show every category with its tiles
    All,

    /// List a page of articles in a subcategory
    Articles {
        category: String,
        sub: String,

        /// Month filter, `YYYY-MM`
        #[arg(short, long)]
        month: Option<String>,

        /// Scope tag, e.g. "Sports"; "All" for no restriction
        #[arg(short, long)]
        scope: Option<String>,

        #[arg(short, long)]
        page: Option<u32>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// Content language (en, hi, te); stored as the new preference
        #[arg(long)]
        lang: Option<Language>,

        /// Page URL query to restore state from, e.g. "?month=2024-03"
        #[arg(long)]
        url_query: Option<String>,
    },

    /// Show a single article
    Article {
        category: String,
        sub: String,
        id: String,

        /// Content language (en, hi, te)
        #[arg(long)]
        lang: Option<Language>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "current_affairs",
            "--json-output-dir",
            "./json",
            "--format",
            "json",
            "landing",
            "upsc",
            "--search",
            "eco",
        ]);

        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(
            cli.command,
            Command::Landing {
                category: "upsc".to_string(),
                search: Some("eco".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "current_affairs",
            "-j",
            "/tmp/json",
            "-c",
            "settings.yaml",
            "articles",
            "upsc",
            "daily",
            "-m",
            "2024-03",
            "-p",
            "2",
            "--lang",
            "te",
        ]);

        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert_eq!(cli.config.as_deref(), Some("settings.yaml"));
        match cli.command {
            Command::Articles { month, page, lang, scope, .. } => {
                assert_eq!(month.as_deref(), Some("2024-03"));
                assert_eq!(page, Some(2));
                assert_eq!(lang, Some(Language::Te));
                assert_eq!(scope, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["current_affairs", "article", "upsc", "daily", "1", "--lang", "fr"]).is_err());
    }
}
