//! JSON HTTP search service.
//!
//! Serves catalog search to clients that cannot run the aggregation
//! themselves. The candidate pool is built once at startup and replaced
//! wholesale by `POST /reload` (last fetch wins).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check, version, and pool status |
//! | `GET`  | `/search?q=&limit=&explain=` | Ranked search over the pool |
//! | `GET`  | `/categories` | Category list (live) |
//! | `GET`  | `/categories/{slug}?page=` | Category detail with one page of products |
//! | `POST` | `/reload` | Re-run the aggregation pass |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "category not found: foo" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the storefront
//! frontend can call the service directly.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use storefront_search_core::aggregate::{
    aggregate_catalog, candidate_pool, CandidatePool, PoolOrigin,
};
use storefront_search_core::catalog::{CatalogSource, FetchError};
use storefront_search_core::listing::format_price;
use storefront_search_core::matcher::{rank_explained, MatchTier};
use storefront_search_core::models::{product_route, CatalogEntry, CategoryEntry};

use crate::api::HttpCatalog;
use crate::categories::{get_category_page, CategoryPage};
use crate::config::Config;
use crate::session::load_fallback;

/// Pool currently served, with its load time.
struct LoadedPool {
    pool: CandidatePool,
    loaded_at: DateTime<Utc>,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    source: Arc<dyn CatalogSource>,
    pool: Arc<RwLock<LoadedPool>>,
}

/// Starts the search service against the configured storefront API.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source: Arc<dyn CatalogSource> = Arc::new(HttpCatalog::new(&config.api)?);
    run_server_with_source(config, source).await
}

/// Starts the search service against any [`CatalogSource`].
///
/// Like [`run_server`], but the catalog is supplied by the caller, which
/// is how tests and embedders serve an [`InMemoryCatalog`] or a custom
/// backend. The candidate pool is built before the listener binds, so
/// the first request already sees a loaded (or degraded) pool.
///
/// # Arguments
///
/// - `config`: `[search]`, `[listing]`, and `[server].bind` are used;
///   `[api]` is ignored.
/// - `source`: catalog to aggregate and to serve category pages from.
///
/// # Returns
///
/// Returns `Ok(())` when the server shuts down, or an error if binding fails.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use storefront_search::server::run_server_with_source;
/// use storefront_search_core::catalog::memory::InMemoryCatalog;
///
/// # async fn example(config: &storefront_search::config::Config) -> anyhow::Result<()> {
/// run_server_with_source(config, Arc::new(InMemoryCatalog::new())).await?;
/// # Ok(())
/// # }
/// ```
///
/// [`InMemoryCatalog`]: storefront_search_core::catalog::memory::InMemoryCatalog
pub async fn run_server_with_source(
    config: &Config,
    source: Arc<dyn CatalogSource>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    let pool = build_pool(source.as_ref(), &config).await;
    info!(entries = pool.pool.entries.len(), degraded = pool.pool.is_degraded(), "candidate pool ready");

    let state = AppState {
        config,
        source,
        pool: Arc::new(RwLock::new(pool)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/categories", get(handle_categories))
        .route("/categories/{slug}", get(handle_category))
        .route("/reload", post(handle_reload))
        .layer(cors)
        .with_state(state);

    info!(%bind_addr, "search service listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_pool(source: &dyn CatalogSource, config: &Config) -> LoadedPool {
    let (fallback, aggregated) = tokio::join!(
        load_fallback(source, config.search.fallback_limit),
        aggregate_catalog(source)
    );
    LoadedPool {
        pool: candidate_pool(aggregated, fallback),
        loaded_at: Utc::now(),
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn upstream(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream".to_string(),
        message: message.into(),
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(what) => not_found(what),
            other => upstream(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FetchError>() {
            Ok(fetch) => fetch.into(),
            Err(other) => upstream(other.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct PoolStatus {
    entries: usize,
    origin: PoolOrigin,
    loaded_at: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    pool: PoolStatus,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let loaded = state.pool.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pool: pool_status(&loaded),
    })
}

fn pool_status(loaded: &LoadedPool) -> PoolStatus {
    PoolStatus {
        entries: loaded.pool.entries.len(),
        origin: loaded.pool.origin.clone(),
        loaded_at: loaded.loaded_at.to_rfc3339(),
    }
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
    #[serde(default)]
    explain: bool,
}

#[derive(Serialize)]
struct SearchHit {
    id: String,
    name: String,
    slug: String,
    route: String,
    price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<MatchTier>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<String>,
    results: Vec<SearchHit>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = params.limit.unwrap_or(state.config.search.max_results);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }

    let loaded = state.pool.read().await;
    let ranked = rank_explained(&params.q, &loaded.pool.entries);
    let total = ranked.len();
    let route_template = &state.config.search.product_route;

    let results = ranked
        .into_iter()
        .take(limit)
        .map(|hit| {
            let mut out = to_hit(&hit.entry, route_template);
            if params.explain {
                out.tier = Some(hit.tier);
            }
            out
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q.clone(),
        total,
        advisory: loaded.pool.advisory().map(str::to_string),
        results,
    }))
}

fn to_hit(entry: &CatalogEntry, route_template: &str) -> SearchHit {
    SearchHit {
        id: entry.id.clone(),
        name: entry.name.clone(),
        slug: entry.slug.clone(),
        route: product_route(route_template, entry),
        price: format_price(&entry.price),
        original_price: entry.original_price.as_ref().map(format_price),
        image_url: entry.image_url.clone(),
        category: entry.category_name().map(str::to_string),
        tier: None,
    }
}

// ============ GET /categories ============

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<CategoryEntry>,
}

async fn handle_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.source.fetch_categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

// ============ GET /categories/{slug} ============

#[derive(Deserialize)]
struct PageParams {
    page: Option<usize>,
}

async fn handle_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<CategoryPage>, AppError> {
    let page = get_category_page(
        state.source.as_ref(),
        &slug,
        params.page.unwrap_or(1),
        state.config.listing.per_page,
    )
    .await?
    .ok_or_else(|| not_found(format!("category not found: {}", slug)))?;
    Ok(Json(page))
}

// ============ POST /reload ============

async fn handle_reload(State(state): State<AppState>) -> Json<PoolStatus> {
    let fresh = build_pool(state.source.as_ref(), &state.config).await;
    let mut loaded = state.pool.write().await;
    *loaded = fresh;
    Json(pool_status(&loaded))
}
