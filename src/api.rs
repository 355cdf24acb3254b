//! The remote current affairs contract and its HTTP implementation.
//!
//! Resolvers talk to the service only through the [`ContentApi`] trait, so the
//! transport can be swapped (the tests use a scripted double). Every endpoint
//! answers with the same `{ success, data }` [`Envelope`].
//!
//! # Endpoints
//!
//! | Method | Path | Query |
//! |--------|------|-------|
//! | [`ContentApi::get_categories`] | `/currentaffairs/categories` | none |
//! | [`ContentApi::get_category_landing`] | `/currentaffairs/{categoryKey}` | none |
//! | [`ContentApi::get_articles_list`] | `/currentaffairs/{categoryKey}/{subId}/articles` | `q, month, page, limit, lang` |
//! | [`ContentApi::get_article_detail`] | `/currentaffairs/{categoryKey}/{subId}/{articleId}` | `lang` |
//!
//! # Transport
//!
//! [`HttpApi`] issues one attempt per call with a client-wide timeout. It
//! attaches a bearer token when one is configured and the preferred language
//! as `x-bb-lang`. There is no retry: callers fall back to the
//! embedded dataset on the first failure.

use crate::error::{Result, TransportError};
use crate::filter::ALL_SCOPES;
use crate::models::{ArticleFilters, Language};
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// The `{ success, data }` wrapper shared by every response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    /// The payload of a successful envelope, if it carries one.
    pub fn payload(&self) -> Option<&Value> {
        if !self.success {
            return None;
        }
        self.data.as_ref().filter(|d| !d.is_null())
    }
}

/// Query parameters of the article list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page: u32,
    pub limit: u32,
    pub lang: Language,
    pub month: Option<String>,
    /// Scope search term, sent as `q`.
    pub q: Option<String>,
}

impl ArticleQuery {
    /// Build the remote query, dropping `month` when unset and `q` when the
    /// scope is unset or `"All"`.
    pub fn from_filters(filters: &ArticleFilters) -> Self {
        Self {
            page: filters.page,
            limit: filters.limit,
            lang: filters.language,
            month: filters.month.clone().filter(|m| !m.is_empty()),
            q: filters
                .scope
                .clone()
                .filter(|s| !s.is_empty() && s != ALL_SCOPES),
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(month) = &self.month {
            pairs.push(("month", month.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("lang", self.lang.code().to_string()));
        pairs
    }
}

/// The remote current affairs service.
pub trait ContentApi {
    async fn get_categories(&self) -> Result<Envelope>;

    async fn get_category_landing(&self, category_key: &str) -> Result<Envelope>;

    async fn get_articles_list(&self, category_key: &str, sub_id: &str, query: &ArticleQuery) -> Result<Envelope>;

    async fn get_article_detail(
        &self,
        category_key: &str,
        sub_id: &str,
        article_id: &str,
        lang: Option<Language>,
    ) -> Result<Envelope>;
}

/// Build `/currentaffairs/{seg}/{seg}...` with every segment percent-encoded.
pub fn endpoint_path(segments: &[&str]) -> String {
    let mut path = String::from("/currentaffairs");
    for segment in segments {
        path.push('/');
        path.push_str(&urlencoding::encode(segment));
    }
    path
}

/// reqwest-backed [`ContentApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for the service rooted at `base_url`
    /// (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: &str, timeout: Duration, token: Option<&str>, language: Language) -> Result<Self> {
        Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-bb-lang", HeaderValue::from_static(language.code()));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::unavailable("bearer token contains invalid header characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder().timeout(timeout).default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(level = "info", skip_all, fields(%path))]
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope> {
        let t0 = Instant::now();
        let url = Url::parse(&format!("{}{}", self.base_url, path))?;

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis() as u64, "Remote call failed");
            return Err(TransportError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_preview = %truncate_for_log(&body, 300),
            "Remote call answered"
        );
        serde_json::from_str::<Envelope>(&body).map_err(|source| TransportError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}

impl ContentApi for HttpApi {
    async fn get_categories(&self) -> Result<Envelope> {
        self.get(&endpoint_path(&["categories"]), &[]).await
    }

    async fn get_category_landing(&self, category_key: &str) -> Result<Envelope> {
        self.get(&endpoint_path(&[category_key]), &[]).await
    }

    async fn get_articles_list(&self, category_key: &str, sub_id: &str, query: &ArticleQuery) -> Result<Envelope> {
        self.get(&endpoint_path(&[category_key, sub_id, "articles"]), &query.to_pairs())
            .await
    }

    async fn get_article_detail(
        &self,
        category_key: &str,
        sub_id: &str,
        article_id: &str,
        lang: Option<Language>,
    ) -> Result<Envelope> {
        let query: Vec<(&str, String)> = lang.map(|l| ("lang", l.code().to_string())).into_iter().collect();
        self.get(&endpoint_path(&[category_key, sub_id, article_id]), &query)
            .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted [`ContentApi`] double keyed by endpoint path.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Envelope(Envelope),
        Fail(String),
    }

    #[derive(Debug, Default)]
    pub struct ScriptedApi {
        replies: HashMap<String, Reply>,
        pub calls: RefCell<Vec<String>>,
        pub queries: RefCell<Vec<ArticleQuery>>,
    }

    impl ScriptedApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, path: &str, envelope: Envelope) -> Self {
            self.replies.insert(path.to_string(), Reply::Envelope(envelope));
            self
        }

        pub fn ok(self, path: &str, data: Value) -> Self {
            self.reply(path, Envelope::ok(data))
        }

        pub fn fail(mut self, path: &str, message: &str) -> Self {
            self.replies.insert(path.to_string(), Reply::Fail(message.to_string()));
            self
        }

        fn answer(&self, path: String) -> Result<Envelope> {
            self.calls.borrow_mut().push(path.clone());
            match self.replies.get(&path) {
                Some(Reply::Envelope(envelope)) => Ok(envelope.clone()),
                Some(Reply::Fail(message)) => Err(TransportError::unavailable(message.clone())),
                None => Err(TransportError::Status {
                    endpoint: path,
                    status: 404,
                }),
            }
        }
    }

    impl ContentApi for ScriptedApi {
        async fn get_categories(&self) -> Result<Envelope> {
            self.answer(endpoint_path(&["categories"]))
        }

        async fn get_category_landing(&self, category_key: &str) -> Result<Envelope> {
            tokio::task::yield_now().await;
            self.answer(endpoint_path(&[category_key]))
        }

        async fn get_articles_list(&self, category_key: &str, sub_id: &str, query: &ArticleQuery) -> Result<Envelope> {
            self.queries.borrow_mut().push(query.clone());
            self.answer(endpoint_path(&[category_key, sub_id, "articles"]))
        }

        async fn get_article_detail(
            &self,
            category_key: &str,
            sub_id: &str,
            article_id: &str,
            _lang: Option<Language>,
        ) -> Result<Envelope> {
            self.answer(endpoint_path(&[category_key, sub_id, article_id]))
        }
    }
}
