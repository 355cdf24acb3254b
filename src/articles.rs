//! Article page resolution for one subcategory under a filter set.
//!
//! The remote service filters, sorts and pages on its own; its answer is only
//! normalized. When the call fails or comes back empty the engine rebuilds the
//! page from the embedded dataset with [`crate::filter`] and
//! [`crate::pagination`], so the caller receives the same [`ResultEnvelope`]
//! shape either way.
//!
//! # Fallback pipeline
//!
//! 1. All articles of `(categoryKey, subId)` from the dataset
//! 2. Language filter (untagged articles pass)
//! 3. Scope filter, only with [`FallbackPolicy::scope_filter`]
//! 4. Month buckets and month filter, only with [`FallbackPolicy::month_buckets`]
//! 5. Newest first, then the requested page (clamped)

use crate::api::{ArticleQuery, ContentApi};
use crate::catalog::CategoryCatalogResolver;
use crate::filter::{FallbackPolicy, aggregate_months, matches_language, matches_month, matches_scope, sort_by_date_desc};
use crate::models::{
    Article, ArticleFilters, DataSource, FallbackReason, Language, PageMeta, Resolved, ResultEnvelope,
    SubcategoryHeading,
};
use crate::normalize::{collection_items, normalize_article, normalize_meta, normalize_month};
use crate::pagination::{clamp_page, compute_total_pages, page_slice};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// One resolved page of articles and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    pub envelope: ResultEnvelope,
    pub source: DataSource,
}

/// Result of an article page resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticlesOutcome {
    Found(ArticlePage),
    /// Neither source had any matching article for the subcategory.
    NotFound { source: DataSource },
}

impl ArticlesOutcome {
    pub fn page(&self) -> Option<&ArticlePage> {
        match self {
            ArticlesOutcome::Found(page) => Some(page),
            ArticlesOutcome::NotFound { .. } => None,
        }
    }

    pub fn source(&self) -> &DataSource {
        match self {
            ArticlesOutcome::Found(page) => &page.source,
            ArticlesOutcome::NotFound { source } => source,
        }
    }
}

/// Raw article records and optional months/meta of a usable remote payload.
struct RemotePayload<'a> {
    articles: Vec<&'a Value>,
    months: Vec<&'a Value>,
    meta: Option<&'a Value>,
}

/// Accept `data` as a bare article array or as `{ articles, months, meta }`;
/// either way it must hold at least one article.
fn remote_payload(data: &Value) -> Option<RemotePayload<'_>> {
    let payload = match data {
        Value::Array(items) => RemotePayload {
            articles: items.iter().collect(),
            months: Vec::new(),
            meta: None,
        },
        Value::Object(_) => RemotePayload {
            articles: data.get("articles").map(collection_items).unwrap_or_default(),
            months: data.get("months").map(collection_items).unwrap_or_default(),
            meta: data.get("meta"),
        },
        _ => return None,
    };
    (!payload.articles.is_empty()).then_some(payload)
}

/// Resolves article pages, single articles and subcategory headings.
#[derive(Debug, Clone)]
pub struct ArticleQueryEngine<A> {
    catalog: CategoryCatalogResolver<A>,
    policy: FallbackPolicy,
}

impl<A: ContentApi> ArticleQueryEngine<A> {
    pub fn new(catalog: CategoryCatalogResolver<A>) -> Self {
        Self {
            catalog,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn catalog(&self) -> &CategoryCatalogResolver<A> {
        &self.catalog
    }

    /// Resolve one page of articles for `(category_key, sub_id)`.
    ///
    /// # Arguments
    ///
    /// * `category_key` - Category identifier, matched case-insensitively
    /// * `sub_id` - Subcategory identifier within the category
    /// * `filters` - Page, page size, language and the optional month and scope
    ///
    /// # Returns
    ///
    /// - [`ArticlesOutcome::Found`] with the remote page when the service
    ///   answers with at least one article
    /// - [`ArticlesOutcome::Found`] with a page rebuilt from the fallback
    ///   dataset otherwise, its `meta.page` clamped into range
    /// - [`ArticlesOutcome::NotFound`] when the fallback has no matching article
    ///   either
    ///
    /// Transport failures never surface as errors; they are recorded in the
    /// outcome's [`DataSource`].
    #[instrument(
        level = "info",
        skip_all,
        fields(category_key = %category_key, sub_id = %sub_id, page = filters.page, lang = %filters.language)
    )]
    pub async fn get_articles(&self, category_key: &str, sub_id: &str, filters: &ArticleFilters) -> ArticlesOutcome {
        let key = category_key.to_lowercase();
        let query = ArticleQuery::from_filters(filters);

        let reason = match self.catalog.api().get_articles_list(&key, sub_id, &query).await {
            Ok(envelope) => match envelope.payload().and_then(remote_payload) {
                Some(payload) => {
                    let page = self.remote_page(payload, sub_id, filters);
                    info!(
                        articles = page.articles.len(),
                        total = page.meta.total,
                        "Resolved articles from remote"
                    );
                    return ArticlesOutcome::Found(ArticlePage {
                        envelope: page,
                        source: DataSource::Remote,
                    });
                }
                None => {
                    info!("Remote returned no articles; using fallback dataset");
                    FallbackReason::Empty
                }
            },
            Err(e) => {
                warn!(error = %e, "Article list fetch failed; using fallback dataset");
                FallbackReason::Transport(e.to_string())
            }
        };

        let source = DataSource::Fallback(reason);
        let page = self.fallback_page(&key, sub_id, filters);
        if page.meta.total == 0 {
            info!("Fallback dataset has no matching articles");
            return ArticlesOutcome::NotFound { source };
        }
        info!(
            articles = page.articles.len(),
            total = page.meta.total,
            "Resolved articles from fallback"
        );
        ArticlesOutcome::Found(ArticlePage { envelope: page, source })
    }

    fn remote_page(&self, payload: RemotePayload<'_>, sub_id: &str, filters: &ArticleFilters) -> ResultEnvelope {
        let articles: Vec<Article> = payload
            .articles
            .into_iter()
            .map(|raw| normalize_article(raw, sub_id).with_default_language())
            .collect();
        let months = payload.months.into_iter().filter_map(normalize_month).collect();
        let meta = normalize_meta(
            payload.meta,
            PageMeta {
                total: articles.len() as u64,
                page: filters.page.max(1),
                limit: filters.limit.max(1),
            },
        );
        ResultEnvelope { articles, months, meta }
    }

    /// Rebuild the requested page from the embedded dataset.
    fn fallback_page(&self, key: &str, sub_id: &str, filters: &ArticleFilters) -> ResultEnvelope {
        let limit = filters.limit.max(1);
        let mut articles: Vec<Article> = self
            .catalog
            .fallback()
            .articles(key, sub_id)
            .into_iter()
            .map(|raw| normalize_article(raw, sub_id))
            .filter(|a| matches_language(a, filters.language))
            .collect();

        if self.policy.scope_filter {
            if let Some(scope) = filters.scope.as_deref() {
                articles.retain(|a| matches_scope(a, scope));
            }
        }

        let months = if self.policy.month_buckets {
            let months = aggregate_months(&articles);
            if let Some(month) = filters.month.as_deref() {
                articles.retain(|a| matches_month(a, month));
            }
            months
        } else {
            Vec::new()
        };

        sort_by_date_desc(&mut articles);

        let total = articles.len() as u64;
        let page = clamp_page(filters.page, compute_total_pages(total, limit));
        debug!(total, page, requested = filters.page, "Paging fallback articles");
        let articles = page_slice(&articles, page, limit)
            .into_iter()
            .map(Article::with_default_language)
            .collect();

        ResultEnvelope {
            articles,
            months,
            meta: PageMeta { total, page, limit },
        }
    }

    /// Resolve a single article, from the remote detail endpoint or the
    /// embedded dataset. `None` when neither has it.
    #[instrument(level = "info", skip_all, fields(category_key = %category_key, sub_id = %sub_id, article_id = %article_id))]
    pub async fn get_article(
        &self,
        category_key: &str,
        sub_id: &str,
        article_id: &str,
        language: Option<Language>,
    ) -> Option<Resolved<Article>> {
        let key = category_key.to_lowercase();
        let reason = match self
            .catalog
            .api()
            .get_article_detail(&key, sub_id, article_id, language)
            .await
        {
            Ok(envelope) => {
                let record = envelope
                    .payload()
                    .map(|data| data.get("article").unwrap_or(data))
                    .filter(|record| record.is_object());
                match record {
                    Some(record) => {
                        let mut article = normalize_article(record, sub_id).with_default_language();
                        if article.id.is_empty() {
                            article.id = article_id.to_string();
                        }
                        return Some(Resolved {
                            value: article,
                            source: DataSource::Remote,
                        });
                    }
                    None => FallbackReason::Empty,
                }
            }
            Err(e) => {
                warn!(error = %e, "Article fetch failed; using fallback dataset");
                FallbackReason::Transport(e.to_string())
            }
        };

        let article = self.catalog.fallback().article(&key, sub_id, article_id)?;
        Some(Resolved {
            value: normalize_article(article, sub_id).with_default_language(),
            source: DataSource::Fallback(reason),
        })
    }

    /// Display title and hero image of a subcategory page.
    pub async fn get_subcategory_heading(&self, category_key: &str, sub_id: &str) -> SubcategoryHeading {
        self.catalog.get_subcategory_heading(category_key, sub_id).await
    }
}
