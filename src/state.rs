//! The query state of an article page and its load lifecycle.
//!
//! [`QueryStateController`] owns the current [`QueryState`] and moves through
//! `Idle → Loading → {Ready, Errored, NotFound}`. Every change to the query goes
//! through [`QueryStateController::submit`], which hands out a
//! [`RequestTicket`] stamped with a fresh generation. Only the completion of
//! the newest ticket is applied; anything older is discarded, so a slow
//! response can never overwrite the result of a newer query.

use crate::api::ContentApi;
use crate::articles::{ArticleQueryEngine, ArticlesOutcome};
use crate::filter::{ALL_SCOPES, is_month_key};
use crate::models::{ArticleFilters, DataSource, Language, ResultEnvelope};
use crate::pagination::{clamp_page, compute_total_pages};
use crate::prefs::UserPreferences;
use tracing::{debug, info, warn};
use url::form_urlencoded;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Everything that determines which article page is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub category_key: String,
    pub sub_id: String,
    pub language: Language,
    /// [`ALL_SCOPES`] or a scope tag.
    pub scope_filter: String,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl QueryState {
    pub fn new(category_key: &str, sub_id: &str, language: Language, page_size: u32) -> Self {
        Self {
            category_key: category_key.to_lowercase(),
            sub_id: sub_id.to_string(),
            language,
            scope_filter: ALL_SCOPES.to_string(),
            month: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filters(&self) -> ArticleFilters {
        ArticleFilters {
            page: self.page,
            limit: self.page_size,
            month: self.month.clone(),
            scope: Some(self.scope_filter.clone()),
            language: self.language,
        }
    }
}

/// Read the month from a URL query string (`?month=YYYY-MM`, leading `?`
/// optional). Malformed months are ignored.
pub fn month_from_query(query: &str) -> Option<String> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == "month")
        .map(|(_, v)| v.into_owned())
        .filter(|m| is_month_key(m))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    /// The remote call failed; the data shown came from the fallback dataset.
    Errored { message: String },
    /// Neither source had anything for the query.
    NotFound,
}

/// Proof of a submitted query; pass it back to [`QueryStateController::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub generation: u64,
    pub query: QueryState,
}

/// What [`QueryStateController::complete`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The ticket was superseded; nothing changed.
    Discarded,
    Applied,
    /// Applied, but the page fell outside the result and was clamped; the new
    /// ticket loads the clamped page.
    Reissued(RequestTicket),
}

#[derive(Debug, Clone)]
pub struct QueryStateController {
    state: QueryState,
    prefs: UserPreferences,
    phase: LoadPhase,
    generation: u64,
    envelope: Option<ResultEnvelope>,
    source: Option<DataSource>,
}

impl QueryStateController {
    pub fn new(category_key: &str, sub_id: &str, prefs: UserPreferences, page_size: u32) -> Self {
        Self {
            state: QueryState::new(category_key, sub_id, prefs.language, page_size),
            prefs,
            phase: LoadPhase::Idle,
            generation: 0,
            envelope: None,
            source: None,
        }
    }

    /// Build a controller for a deep link; `query` is the URL query string.
    pub fn from_url(category_key: &str, sub_id: &str, query: &str, prefs: UserPreferences, page_size: u32) -> Self {
        let mut controller = Self::new(category_key, sub_id, prefs, page_size);
        controller.state.month = month_from_query(query);
        controller
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn preferences(&self) -> UserPreferences {
        self.prefs
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The data currently on display.
    pub fn envelope(&self) -> Option<&ResultEnvelope> {
        self.envelope.as_ref()
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    /// The informational message to show alongside the data, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.phase {
            LoadPhase::Errored { message } => Some(message),
            _ => None,
        }
    }

    pub fn total_pages(&self) -> u32 {
        let total = self.envelope.as_ref().map_or(0, |e| e.meta.total);
        compute_total_pages(total, self.state.page_size)
    }

    /// The URL query string reflecting the current state (`?month=…` or empty).
    pub fn to_url_query(&self) -> String {
        match &self.state.month {
            Some(month) => format!("?month={month}"),
            None => String::new(),
        }
    }

    /// Commit `query` as the current state and start loading it.
    pub fn submit(&mut self, query: QueryState) -> RequestTicket {
        self.generation += 1;
        self.state = query;
        self.phase = LoadPhase::Loading;
        debug!(generation = self.generation, state = ?self.state, "Submitted query");
        RequestTicket {
            generation: self.generation,
            query: self.state.clone(),
        }
    }

    /// Re-issue the current state, e.g. on first load.
    pub fn reload(&mut self) -> RequestTicket {
        self.submit(self.state.clone())
    }

    fn submit_if_changed(&mut self, next: QueryState) -> Option<RequestTicket> {
        (next != self.state).then(|| self.submit(next))
    }

    /// Switch language. Resets to page 1 and returns the updated preferences
    /// for the caller to persist.
    pub fn select_language(&mut self, language: Language) -> (UserPreferences, Option<RequestTicket>) {
        self.prefs.language = language;
        let mut next = self.state.clone();
        next.language = language;
        next.page = 1;
        info!(lang = %language, "Language changed");
        (self.prefs, self.submit_if_changed(next))
    }

    /// Toggle a month filter: selecting the active month clears it. Always
    /// returns to page 1. Keys other than `YYYY-MM` are ignored.
    pub fn handle_month_click(&mut self, month_key: &str) -> Option<RequestTicket> {
        if !is_month_key(month_key) {
            warn!(%month_key, "Ignoring month key; expected YYYY-MM");
            return None;
        }
        let mut next = self.state.clone();
        next.month = if self.state.month.as_deref() == Some(month_key) {
            None
        } else {
            Some(month_key.to_string())
        };
        next.page = 1;
        self.submit_if_changed(next)
    }

    /// Select a scope tag ([`ALL_SCOPES`] clears it) and return to page 1.
    pub fn select_scope(&mut self, scope: &str) -> Option<RequestTicket> {
        let mut next = self.state.clone();
        next.scope_filter = if scope.is_empty() { ALL_SCOPES.to_string() } else { scope.to_string() };
        next.page = 1;
        self.submit_if_changed(next)
    }

    /// Move to page `page`, clamped to the known page count. No-op when the
    /// clamped page is already current.
    pub fn go_to_page(&mut self, page: u32) -> Option<RequestTicket> {
        let mut next = self.state.clone();
        next.page = clamp_page(page, self.total_pages());
        self.submit_if_changed(next)
    }

    /// Re-derive the month from the URL query string. Idempotent.
    pub fn sync_from_url(&mut self, query: &str) -> Option<RequestTicket> {
        let mut next = self.state.clone();
        next.month = month_from_query(query);
        if next.month != self.state.month {
            next.page = 1;
        }
        self.submit_if_changed(next)
    }

    /// Apply the outcome of `ticket` if it is still the newest one.
    ///
    /// # Arguments
    ///
    /// * `ticket` - The ticket returned by the [`Self::submit`] that started the load
    /// * `outcome` - What the engine resolved for the ticket's query
    ///
    /// # Returns
    ///
    /// - [`Completion::Discarded`] if a newer query was submitted meanwhile
    /// - [`Completion::Reissued`] if the page fell outside the result; the state
    ///   already holds the clamped page and the new ticket loads it
    /// - [`Completion::Applied`] otherwise
    ///
    /// A `NotFound` outcome clears the data and resets the page to 1.
    pub fn complete(&mut self, ticket: &RequestTicket, outcome: ArticlesOutcome) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding superseded result"
            );
            return Completion::Discarded;
        }

        match outcome {
            ArticlesOutcome::Found(page) => {
                self.phase = match page.source.transport_error() {
                    Some(message) => LoadPhase::Errored {
                        message: message.to_string(),
                    },
                    None => LoadPhase::Ready,
                };
                self.envelope = Some(page.envelope);
                self.source = Some(page.source);
            }
            ArticlesOutcome::NotFound { source } => {
                info!(state = ?self.state, "No articles found");
                self.phase = LoadPhase::NotFound;
                self.envelope = None;
                self.source = Some(source);
                self.state.page = 1;
                return Completion::Applied;
            }
        }

        let clamped = clamp_page(self.state.page, self.total_pages());
        if clamped != self.state.page {
            warn!(requested = self.state.page, clamped, "Page out of range; reloading last page");
            let mut next = self.state.clone();
            next.page = clamped;
            return Completion::Reissued(self.submit(next));
        }
        Completion::Applied
    }

    /// Resolve `ticket` with `engine` and apply the result, following a
    /// clamped re-issue once.
    pub async fn load<A: ContentApi>(&mut self, engine: &ArticleQueryEngine<A>, ticket: RequestTicket) -> Completion {
        let mut ticket = ticket;
        let mut reissued = false;
        loop {
            let q = &ticket.query;
            let outcome = engine.get_articles(&q.category_key, &q.sub_id, &q.filters()).await;
            match self.complete(&ticket, outcome) {
                Completion::Reissued(next) if !reissued => {
                    reissued = true;
                    ticket = next;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedApi;
    use crate::articles::ArticlePage;
    use crate::catalog::CategoryCatalogResolver;
    use crate::fallback::FallbackDataset;
    use crate::models::{FallbackReason, PageMeta};
    use serde_json::json;
    use std::sync::Arc;

    fn controller() -> QueryStateController {
        QueryStateController::new("UPSC", "daily", UserPreferences::default(), DEFAULT_PAGE_SIZE)
    }

    fn page(total: u64, page: u32, source: DataSource) -> ArticlesOutcome {
        ArticlesOutcome::Found(ArticlePage {
            envelope: ResultEnvelope {
                articles: Vec::new(),
                months: Vec::new(),
                meta: PageMeta {
                    total,
                    page,
                    limit: DEFAULT_PAGE_SIZE,
                },
            },
            source,
        })
    }

    #[test]
    fn test_new_controller_is_idle_on_page_one() {
        let c = controller();
        assert_eq!(c.phase(), &LoadPhase::Idle);
        assert_eq!(c.state().category_key, "upsc");
        assert_eq!(c.state().page, 1);
        assert_eq!(c.state().scope_filter, ALL_SCOPES);
        assert_eq!(c.total_pages(), 1);
    }

    #[test]
    fn test_month_click_toggles_and_resets_page() {
        let mut c = controller();
        c.state.page = 4;
        assert!(c.handle_month_click("2024-03").is_some());
        assert_eq!(c.state().month.as_deref(), Some("2024-03"));
        assert_eq!(c.state().page, 1);

        c.state.page = 2;
        assert!(c.handle_month_click("2024-03").is_some());
        assert_eq!(c.state().month, None);
        assert_eq!(c.state().page, 1);
        assert_eq!(c.phase(), &LoadPhase::Loading);
    }

    #[test]
    fn test_language_change_resets_page_and_returns_preferences() {
        let mut c = controller();
        c.state.page = 3;
        let (prefs, ticket) = c.select_language(Language::Te);
        assert_eq!(prefs.language, Language::Te);
        assert_eq!(c.preferences().language, Language::Te);
        let ticket = ticket.unwrap();
        assert_eq!(ticket.query.language, Language::Te);
        assert_eq!(ticket.query.page, 1);

        let (_, again) = c.select_language(Language::Te);
        assert!(again.is_none());
    }

    #[test]
    fn test_scope_selection_resets_page() {
        let mut c = controller();
        c.state.page = 2;
        let ticket = c.select_scope("Sports").unwrap();
        assert_eq!(ticket.query.scope_filter, "Sports");
        assert_eq!(ticket.query.page, 1);
        assert_eq!(c.select_scope("").unwrap().query.scope_filter, ALL_SCOPES);
    }

    #[test]
    fn test_go_to_page_clamps_and_skips_noops() {
        let mut c = controller();
        let ticket = c.reload();
        c.complete(&ticket, page(45, 1, DataSource::Remote));
        assert_eq!(c.total_pages(), 3);

        assert_eq!(c.go_to_page(9).unwrap().query.page, 3);
        assert!(c.go_to_page(3).is_none());
        assert_eq!(c.go_to_page(0).unwrap().query.page, 1);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut c = controller();
        let first = c.reload();
        let second = c.handle_month_click("2024-03").unwrap();

        assert_eq!(c.complete(&first, page(99, 1, DataSource::Remote)), Completion::Discarded);
        assert_eq!(c.phase(), &LoadPhase::Loading);
        assert!(c.envelope().is_none());

        assert_eq!(c.complete(&second, page(5, 1, DataSource::Remote)), Completion::Applied);
        assert_eq!(c.phase(), &LoadPhase::Ready);
        assert_eq!(c.envelope().unwrap().meta.total, 5);

        // A late answer for the first ticket still cannot clobber the newer data.
        assert_eq!(c.complete(&first, page(99, 1, DataSource::Remote)), Completion::Discarded);
        assert_eq!(c.envelope().unwrap().meta.total, 5);
    }

    #[test]
    fn test_transport_fallback_is_errored_but_keeps_data() {
        let mut c = controller();
        let ticket = c.reload();
        let source = DataSource::Fallback(FallbackReason::Transport("timeout".to_string()));
        c.complete(&ticket, page(3, 1, source));
        assert_eq!(c.message(), Some("timeout"));
        assert!(c.envelope().is_some());

        let ticket = c.reload();
        c.complete(&ticket, page(3, 1, DataSource::Fallback(FallbackReason::Empty)));
        assert_eq!(c.phase(), &LoadPhase::Ready);
        assert_eq!(c.message(), None);
    }

    #[test]
    fn test_not_found_clears_data() {
        let mut c = controller();
        let ticket = c.reload();
        c.complete(&ticket, page(3, 1, DataSource::Remote));
        let ticket = c.select_language(Language::Hi).1.unwrap();
        c.complete(
            &ticket,
            ArticlesOutcome::NotFound {
                source: DataSource::Fallback(FallbackReason::Empty),
            },
        );
        assert_eq!(c.phase(), &LoadPhase::NotFound);
        assert!(c.envelope().is_none());
    }

    #[test]
    fn test_not_found_resets_page() {
        let mut c = controller();
        let mut state = c.state().clone();
        state.page = 7;
        let ticket = c.submit(state);
        let completion = c.complete(
            &ticket,
            ArticlesOutcome::NotFound {
                source: DataSource::Fallback(FallbackReason::Empty),
            },
        );
        assert_eq!(completion, Completion::Applied);
        assert_eq!(c.state().page, 1);
        assert_eq!(c.total_pages(), 1);
    }

    #[test]
    fn test_month_click_ignores_malformed_keys() {
        let mut c = controller();
        assert!(c.handle_month_click("March").is_none());
        assert!(c.handle_month_click("2024-13").is_none());
        assert_eq!(c.state().month, None);
        assert_eq!(c.phase(), &LoadPhase::Idle);
    }

    #[test]
    fn test_out_of_range_page_is_reissued_clamped() {
        let mut c = controller();
        let mut state = c.state().clone();
        state.page = 7;
        let ticket = c.submit(state);
        match c.complete(&ticket, page(30, 7, DataSource::Remote)) {
            Completion::Reissued(next) => {
                assert_eq!(next.query.page, 2);
                assert_eq!(next.generation, ticket.generation + 1);
            }
            other => panic!("expected a reissue, got {other:?}"),
        }
    }

    #[test]
    fn test_url_state_round_trip() {
        let c = QueryStateController::from_url("upsc", "daily", "?month=2024-03&page=2", UserPreferences::default(), 20);
        assert_eq!(c.state().month.as_deref(), Some("2024-03"));
        assert_eq!(c.to_url_query(), "?month=2024-03");

        let c = QueryStateController::from_url("upsc", "daily", "month=March", UserPreferences::default(), 20);
        assert_eq!(c.state().month, None);
        assert_eq!(c.to_url_query(), "");
    }

    #[test]
    fn test_sync_from_url_is_idempotent() {
        let mut c = controller();
        assert!(c.sync_from_url("?month=2024-02").is_some());
        assert!(c.sync_from_url("?month=2024-02").is_none());
        assert!(c.sync_from_url("").is_some());
        assert_eq!(c.state().month, None);
    }

    #[tokio::test]
    async fn test_load_resolves_through_engine() {
        let api = ScriptedApi::new().fail("/currentaffairs/upsc/daily/articles", "connection reset");
        let engine = ArticleQueryEngine::new(CategoryCatalogResolver::new(Arc::new(api), FallbackDataset::embedded()));
        let mut c = QueryStateController::new(
            "upsc",
            "daily",
            UserPreferences {
                language: Language::Hi,
            },
            20,
        );
        let ticket = c.reload();
        assert_eq!(c.load(&engine, ticket).await, Completion::Applied);
        assert_eq!(c.message(), Some("connection reset"));
        assert_eq!(c.envelope().unwrap().articles.len(), 2);
    }

    #[tokio::test]
    async fn test_load_follows_one_clamped_reissue() {
        let api = ScriptedApi::new().ok(
            "/currentaffairs/upsc/daily/articles",
            json!({"articles": [{"id": "r1"}], "meta": {"total": 1, "page": 5, "limit": 20}}),
        );
        let engine = ArticleQueryEngine::new(CategoryCatalogResolver::new(Arc::new(api), FallbackDataset::embedded()));
        let mut c = controller();
        let mut state = c.state().clone();
        state.page = 5;
        let ticket = c.submit(state);
        assert_eq!(c.load(&engine, ticket).await, Completion::Applied);
        assert_eq!(c.state().page, 1);
        assert_eq!(c.phase(), &LoadPhase::Ready);
    }
}
