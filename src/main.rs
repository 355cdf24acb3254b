//! Command-line browser for current affairs content.
//!
//! ## Usage
//!
//! ```sh
//! current_affairs categories
//! current_affairs landing upsc --search economy
//! current_affairs articles upsc daily --month 2024-03 --lang hi
//! current_affairs article upsc daily upsc-daily-001
//! ```

use clap::Parser;
use current_affairs::api::{ContentApi, HttpApi};
use current_affairs::articles::ArticleQueryEngine;
use current_affairs::catalog::CategoryCatalogResolver;
use current_affairs::cli::{Cli, Command, OutputFormat};
use current_affairs::config::Settings;
use current_affairs::fallback::FallbackDataset;
use current_affairs::filter::{SCOPE_FILTERS, filter_tiles, is_month_key};
use current_affairs::models::DataSource;
use current_affairs::outputs::{json, text};
use current_affairs::prefs::{PreferenceStore, UserPreferences};
use current_affairs::state::QueryStateController;
use serde_json::{Value, json as json_value};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// A rendered command result.
struct Rendered {
    label: String,
    text: String,
    json: Value,
}

fn source_label(source: &DataSource) -> &'static str {
    if source.is_remote() { "remote" } else { "fallback" }
}

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    // Parse CLI
    let args = Cli::parse();
    debug!(command = ?args.command, format = ?args.format, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref()).await?.apply_cli(&args);
    info!(api_base_url = %settings.api_base_url, timeout_secs = settings.timeout_secs, "Loaded configuration");

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = current_affairs::utils::ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    let store = PreferenceStore::new(&settings.preferences_path);
    let prefs = store.load().await;
    let language = match &args.command {
        Command::Articles { lang: Some(lang), .. } | Command::Article { lang: Some(lang), .. } => *lang,
        _ => prefs.language,
    };

    let api = HttpApi::new(&settings.api_base_url, settings.timeout(), args.token.as_deref(), language)?;
    let catalog = CategoryCatalogResolver::new(Arc::new(api), FallbackDataset::embedded())
        .with_asset_base(settings.asset_base())
        .with_concurrency(settings.landing_concurrency);
    let engine = ArticleQueryEngine::new(catalog).with_policy(settings.fallback);

    let rendered = run(&args.command, &settings, &engine, &store, prefs).await?;

    match args.format {
        OutputFormat::Text => print!("{}", rendered.text),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendered.json)?),
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_snapshot(&rendered.json, dir, &rendered.label).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");

    Ok(())
}

async fn run<A: ContentApi>(
    command: &Command,
    settings: &Settings,
    engine: &ArticleQueryEngine<A>,
    store: &PreferenceStore,
    prefs: UserPreferences,
) -> Result<Rendered, Box<dyn Error>> {
    let catalog = engine.catalog();
    match command {
        Command::Categories => {
            let resolved = catalog.list_categories().await;
            Ok(Rendered {
                label: "categories".to_string(),
                text: text::render_categories(&resolved.value, &resolved.source),
                json: json_value!({
                    "source": source_label(&resolved.source),
                    "categories": resolved.value,
                }),
            })
        }

        Command::Landing { category, search } => {
            let mut resolved = catalog.get_category_landing(category).await;
            if let Some(query) = search {
                resolved.value.tiles = filter_tiles(&resolved.value.tiles, query);
            }
            Ok(Rendered {
                label: resolved.value.category.id.clone(),
                text: text::render_landing(&resolved.value),
                json: json_value!({
                    "source": source_label(&resolved.source),
                    "landing": resolved.value,
                }),
            })
        }

        Command::All => {
            let landings = catalog.overview().await;
            Ok(Rendered {
                label: "all".to_string(),
                text: text::render_overview(&landings),
                json: json_value!({ "categories": landings }),
            })
        }

        Command::Articles {
            category,
            sub,
            month,
            scope,
            page,
            limit,
            lang,
            url_query,
        } => {
            let page_size = limit.unwrap_or_else(|| settings.page_size()).max(1);
            let mut controller =
                QueryStateController::from_url(category, sub, url_query.as_deref().unwrap_or_default(), prefs, page_size);

            if let Some(lang) = lang {
                let (updated, _) = controller.select_language(*lang);
                if updated != prefs {
                    if let Err(e) = store.save(&updated).await {
                        warn!(error = %e, "Failed to save language preference");
                    }
                }
            }

            let mut query = controller.state().clone();
            if let Some(month) = month {
                if is_month_key(month) {
                    query.month = Some(month.clone());
                } else {
                    warn!(%month, "Ignoring month filter; expected YYYY-MM");
                }
            }
            if let Some(scope) = scope {
                if !SCOPE_FILTERS.contains(&scope.as_str()) {
                    warn!(%scope, known = ?SCOPE_FILTERS, "Unknown scope tag");
                }
                query.scope_filter = scope.clone();
            }
            query.page = page.unwrap_or(1).max(1);

            let ticket = controller.submit(query);
            let completion = controller.load(engine, ticket).await;
            debug!(?completion, phase = ?controller.phase(), "Article page loaded");

            let heading = engine.get_subcategory_heading(category, sub).await;
            let state = controller.state();
            Ok(Rendered {
                label: format!("{} {} p{}", state.category_key, state.sub_id, state.page),
                text: text::render_articles(&controller, &heading),
                json: json_value!({
                    "source": controller.source().map(source_label),
                    "message": controller.message(),
                    "heading": heading,
                    "query": {
                        "categoryKey": state.category_key,
                        "subId": state.sub_id,
                        "language": state.language,
                        "scope": state.scope_filter,
                        "month": state.month,
                        "page": state.page,
                        "pageSize": state.page_size,
                        "urlQuery": controller.to_url_query(),
                    },
                    "result": controller.envelope(),
                }),
            })
        }

        Command::Article { category, sub, id, lang } => {
            let language = lang.unwrap_or(prefs.language);
            let Some(resolved) = engine.get_article(category, sub, id, Some(language)).await else {
                return Err(format!("article '{id}' not found in {category}/{sub}").into());
            };
            Ok(Rendered {
                label: format!("{} {} {}", category.to_lowercase(), sub, id),
                text: text::render_article(&resolved.value, &resolved.source),
                json: json_value!({
                    "source": source_label(&resolved.source),
                    "article": resolved.value,
                }),
            })
        }
    }
}
