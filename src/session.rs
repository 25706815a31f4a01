//! Search session: the ephemeral state of one open search surface.
//!
//! A [`SearchSession`] binds the catalog aggregator, the query debouncer,
//! the ranking matcher, and the keyboard navigator together. It is
//! created when the search surface opens and discarded when it closes.
//!
//! # Lifecycle
//!
//! 1. [`open`](SearchSession::open) spawns one aggregation pass. Until it
//!    completes, queries run against the caller-supplied fallback list.
//! 2. The finished pass installs the candidate pool, which is never
//!    mutated afterwards. An active query is re-ranked against it unless
//!    a debounced evaluation is still pending, in which case that
//!    evaluation ranks the new pool. If the session was closed in the
//!    meantime the result is discarded; nothing is cancelled upstream.
//! 3. [`input`](SearchSession::input) debounces keystrokes;
//!    [`key`](SearchSession::key) drives the selection cursor.
//! 4. [`close`](SearchSession::close) cancels the pending debounce timer
//!    and drops all session state.
//!
//! The state sits behind a `std::sync::Mutex` shared with the loader and
//! debounce tasks. The lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use storefront_search_core::aggregate::{
    aggregate_catalog, candidate_pool, load_candidate_pool, CandidatePool,
};
use storefront_search_core::catalog::CatalogSource;
use storefront_search_core::matcher::rank;
use storefront_search_core::models::{product_route, CatalogEntry};
use storefront_search_core::navigator::{Key, KeyboardNavigator, NavEvent};

use crate::config::SearchConfig;
use crate::debounce::Debouncer;

/// Fetch the featured items used as the fallback pool.
///
/// Failure yields an empty fallback rather than an error.
pub async fn load_fallback(source: &dyn CatalogSource, limit: usize) -> Vec<CatalogEntry> {
    match source.fetch_featured(limit).await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "featured items unavailable; fallback pool is empty");
            Vec::new()
        }
    }
}

/// Receives the route of a confirmed result.
pub trait RouteNavigator: Send + Sync {
    fn navigate_to(&self, route: &str);
}

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub debounce: Duration,
    /// Route template; `{slug}` is replaced by the entry's slug.
    pub product_route: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SessionOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            product_route: config.product_route.clone(),
        }
    }
}

/// Candidate pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Aggregation in flight; searching the fallback list.
    Loading,
    /// Full catalog loaded.
    Ready,
    /// Category list failed; the fallback list is the pool.
    Degraded,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub open: bool,
    pub query: String,
    pub results: Vec<CatalogEntry>,
    pub cursor: usize,
    pub status: LoadStatus,
    pub advisory: Option<String>,
    pub pool_size: usize,
    /// Number of rank passes run so far.
    pub evaluations: u64,
}

/// Result of a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Moved(usize),
    Confirmed { entry: CatalogEntry, route: String },
    Closed,
    Ignored,
}

struct SessionState {
    open: bool,
    query: String,
    fallback: Vec<CatalogEntry>,
    pool: Option<CandidatePool>,
    results: Vec<CatalogEntry>,
    nav: KeyboardNavigator,
    evaluations: u64,
}

impl SessionState {
    fn new(fallback: Vec<CatalogEntry>) -> Self {
        Self {
            open: true,
            query: String::new(),
            fallback,
            pool: None,
            results: Vec::new(),
            nav: KeyboardNavigator::default(),
            evaluations: 0,
        }
    }

    fn candidates(&self) -> &[CatalogEntry] {
        match &self.pool {
            Some(pool) => &pool.entries,
            None => &self.fallback,
        }
    }

    fn status(&self) -> LoadStatus {
        match &self.pool {
            None => LoadStatus::Loading,
            Some(pool) if pool.is_degraded() => LoadStatus::Degraded,
            Some(_) => LoadStatus::Ready,
        }
    }

    fn evaluate(&mut self, query: &str) {
        self.results = rank(query, self.candidates());
        self.nav.reset(self.results.len());
        self.evaluations += 1;
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.nav.reset(0);
    }

    /// Replace the fallback list while the pool is still loading.
    fn provide_fallback(&mut self, entries: Vec<CatalogEntry>, rerank: bool) {
        if !self.open || self.pool.is_some() {
            return;
        }
        self.fallback = entries;
        if rerank && !self.query.trim().is_empty() {
            let query = self.query.clone();
            self.evaluate(&query);
        }
    }

    /// Install the loaded pool. With `rerank` set, an active query is
    /// ranked against it right away; otherwise a pending debounced
    /// evaluation will pick it up.
    fn install(&mut self, pool: CandidatePool, rerank: bool) {
        self.pool = Some(pool);
        if rerank && !self.query.trim().is_empty() {
            let query = self.query.clone();
            self.evaluate(&query);
        }
    }

    fn teardown(&mut self) {
        self.open = false;
        self.query.clear();
        self.fallback.clear();
        self.pool = None;
        self.clear_results();
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// One open search surface.
pub struct SearchSession {
    state: Arc<Mutex<SessionState>>,
    debouncer: Arc<Debouncer>,
    router: Arc<dyn RouteNavigator>,
    product_route: String,
    loaded: watch::Receiver<bool>,
}

/// Where the fallback list comes from.
enum Fallback {
    /// Supplied by the caller at open.
    Given(Vec<CatalogEntry>),
    /// Fetched from the featured items alongside the aggregation pass.
    Featured(usize),
}

impl SearchSession {
    /// Open a session and start loading the candidate pool.
    ///
    /// Queries typed before the pool is installed rank against
    /// `fallback`, which also becomes the pool if the category list
    /// cannot be fetched. Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// - `source`: catalog to aggregate.
    /// - `fallback`: entries searched while loading and on category-list failure.
    /// - `router`: receives the product route when a result is confirmed.
    /// - `options`: debounce interval and route template.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use storefront_search::search::LogRouter;
    /// use storefront_search::session::{SearchSession, SessionOptions};
    /// use storefront_search_core::catalog::memory::InMemoryCatalog;
    ///
    /// # async fn example() {
    /// let session = SearchSession::open(
    ///     Arc::new(InMemoryCatalog::new()),
    ///     Vec::new(),
    ///     Arc::new(LogRouter),
    ///     SessionOptions::default(),
    /// );
    /// session.input("valorant");
    /// # }
    /// ```
    pub fn open(
        source: Arc<dyn CatalogSource>,
        fallback: Vec<CatalogEntry>,
        router: Arc<dyn RouteNavigator>,
        options: SessionOptions,
    ) -> Self {
        Self::spawn(source, Fallback::Given(fallback), router, options)
    }

    /// Like [`open`](Self::open), but fetches up to `fallback_limit`
    /// featured items concurrently with the aggregation pass instead of
    /// taking the fallback list up front. The session is usable at once;
    /// queries rank against nothing until the featured items arrive.
    pub fn open_with_featured(
        source: Arc<dyn CatalogSource>,
        fallback_limit: usize,
        router: Arc<dyn RouteNavigator>,
        options: SessionOptions,
    ) -> Self {
        Self::spawn(source, Fallback::Featured(fallback_limit), router, options)
    }

    fn spawn(
        source: Arc<dyn CatalogSource>,
        fallback: Fallback,
        router: Arc<dyn RouteNavigator>,
        options: SessionOptions,
    ) -> Self {
        let initial = match &fallback {
            Fallback::Given(entries) => entries.clone(),
            Fallback::Featured(_) => Vec::new(),
        };
        let state = Arc::new(Mutex::new(SessionState::new(initial)));
        let (loaded_tx, loaded_rx) = watch::channel(false);

        let debouncer = Arc::new(Debouncer::new(options.debounce));
        let loader_state = Arc::clone(&state);
        let loader_debouncer = Arc::clone(&debouncer);
        tokio::spawn(async move {
            let pool = match fallback {
                Fallback::Given(entries) => load_candidate_pool(source.as_ref(), entries).await,
                Fallback::Featured(limit) => {
                    let featured = async {
                        let entries = load_fallback(source.as_ref(), limit).await;
                        lock(&loader_state)
                            .provide_fallback(entries.clone(), !loader_debouncer.is_pending());
                        entries
                    };
                    let (entries, aggregated) =
                        tokio::join!(featured, aggregate_catalog(source.as_ref()));
                    candidate_pool(aggregated, entries)
                }
            };

            {
                let mut st = lock(&loader_state);
                if !st.open {
                    debug!("session closed before the catalog loaded; discarding");
                    return;
                }
                debug!(entries = pool.entries.len(), degraded = pool.is_degraded(), "candidate pool installed");
                st.install(pool, !loader_debouncer.is_pending());
            }
            let _ = loaded_tx.send(true);
        });

        Self {
            state,
            debouncer,
            router,
            product_route: options.product_route,
            loaded: loaded_rx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    /// Wait until the candidate pool is installed.
    ///
    /// Returns immediately if it already is, or if the session was
    /// closed before loading finished.
    pub async fn wait_loaded(&self) {
        let mut rx = self.loaded.clone();
        let _ = rx.wait_for(|loaded| *loaded).await;
    }

    /// Record a keystroke. Non-empty queries are evaluated once input has
    /// been quiet for the debounce interval; an empty query clears the
    /// results immediately.
    pub fn input(&self, query: &str) {
        if query.trim().is_empty() {
            self.debouncer.cancel();
            let mut st = self.lock();
            if st.open {
                st.query = query.to_string();
                st.clear_results();
            }
            return;
        }

        {
            let mut st = self.lock();
            if !st.open {
                return;
            }
            st.query = query.to_string();
        }

        let state = Arc::clone(&self.state);
        let query = query.to_string();
        self.debouncer.schedule(move || {
            let mut st = lock(&state);
            if st.open {
                st.evaluate(&query);
            }
        });
    }

    /// Set the query and rank immediately, bypassing the debouncer.
    pub fn evaluate_now(&self, query: &str) -> Vec<CatalogEntry> {
        self.debouncer.cancel();
        let mut st = self.lock();
        if !st.open {
            return Vec::new();
        }
        st.query = query.to_string();
        if query.trim().is_empty() {
            st.clear_results();
        } else {
            st.evaluate(query);
        }
        st.results.clone()
    }

    /// Handle a navigation key.
    ///
    /// `Enter` hands the selected entry's route to the [`RouteNavigator`]
    /// and closes the session; `Escape` closes it.
    pub fn key(&self, key: Key) -> KeyOutcome {
        let confirmed = {
            let mut st = self.lock();
            if !st.open {
                return KeyOutcome::Ignored;
            }
            match st.nav.handle(key) {
                NavEvent::Moved(i) => return KeyOutcome::Moved(i),
                NavEvent::Ignored => return KeyOutcome::Ignored,
                NavEvent::Close => None,
                NavEvent::Confirm(i) => st.results.get(i).cloned(),
            }
        };

        match confirmed {
            Some(entry) => {
                let route = product_route(&self.product_route, &entry);
                self.router.navigate_to(&route);
                self.close();
                KeyOutcome::Confirmed { entry, route }
            }
            None => {
                self.close();
                KeyOutcome::Closed
            }
        }
    }

    /// Close the session, cancelling the pending debounce timer and
    /// discarding all state. Idempotent.
    pub fn close(&self) {
        self.debouncer.cancel();
        self.lock().teardown();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// The entry under the cursor, if any.
    pub fn selected(&self) -> Option<CatalogEntry> {
        let st = self.lock();
        st.results.get(st.nav.cursor()).cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.lock();
        SessionSnapshot {
            open: st.open,
            query: st.query.clone(),
            results: st.results.clone(),
            cursor: st.nav.cursor(),
            status: st.status(),
            advisory: st
                .pool
                .as_ref()
                .and_then(|p| p.advisory())
                .map(str::to_string),
            pool_size: st.candidates().len(),
            evaluations: st.evaluations,
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.close();
    }
}
