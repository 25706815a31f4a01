//! Catalog source abstraction.
//!
//! The [`CatalogSource`] trait is the boundary to the storefront REST
//! API. The aggregator, the search session, and the listing commands
//! only ever talk to a `CatalogSource`, so the HTTP client and the
//! in-memory catalog used in tests are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CatalogEntry, CategoryEntry};

/// Errors raised at the catalog boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The requested category does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Abstract read-only view of the storefront catalog.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_categories`](CatalogSource::fetch_categories) | All categories |
/// | [`fetch_category`](CatalogSource::fetch_category) | One category by slug |
/// | [`fetch_category_products`](CatalogSource::fetch_category_products) | Products of one category |
/// | [`fetch_featured`](CatalogSource::fetch_featured) | Homepage items, used as the search fallback |
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<CategoryEntry>, FetchError>;

    /// Returns `Ok(None)` when no category has this slug.
    async fn fetch_category(&self, slug: &str) -> Result<Option<CategoryEntry>, FetchError>;

    async fn fetch_category_products(&self, slug: &str) -> Result<Vec<CatalogEntry>, FetchError>;

    async fn fetch_featured(&self, limit: usize) -> Result<Vec<CatalogEntry>, FetchError>;
}
