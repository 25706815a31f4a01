//! Catalog aggregation: build the search candidate pool.
//!
//! # Algorithm
//!
//! 1. Fetch the category list. Failure here aborts the pass.
//! 2. Issue every category's product fetch at once and await them together.
//! 3. A failed category contributes zero entries (logged, not surfaced).
//! 4. Tag each product with its category and flatten in category order.
//!
//! [`load_candidate_pool`] wraps this with the fallback rule: if the
//! category list cannot be fetched, the caller-supplied fallback list
//! becomes the pool and an advisory message is attached. No fetch is ever
//! retried.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{CatalogSource, FetchError};
use crate::models::{CatalogEntry, CategoryEntry};

/// Shown to the user when the search runs on the fallback pool.
pub const FALLBACK_ADVISORY: &str =
    "Products could not be loaded. Showing featured items instead.";

/// Where a candidate pool came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolOrigin {
    /// Full aggregation over all categories.
    Catalog { categories: usize, failed_categories: usize },
    /// Category list failed; the fallback list is in use.
    Fallback { advisory: String, reason: String },
}

/// The candidate pool of one search session.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub entries: Vec<CatalogEntry>,
    pub origin: PoolOrigin,
}

impl CandidatePool {
    pub fn is_degraded(&self) -> bool {
        matches!(self.origin, PoolOrigin::Fallback { .. })
    }

    /// User-visible advisory, if the pool is degraded.
    pub fn advisory(&self) -> Option<&str> {
        match &self.origin {
            PoolOrigin::Fallback { advisory, .. } => Some(advisory),
            PoolOrigin::Catalog { .. } => None,
        }
    }
}

/// Result of one aggregation pass over a category list.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub entries: Vec<CatalogEntry>,
    pub categories: usize,
    pub failed: Vec<String>,
}

/// Fetch all categories and their products.
///
/// Per-category failures are isolated; only a category-list failure is
/// returned as an error.
pub async fn aggregate_catalog<S>(source: &S) -> Result<Aggregation, FetchError>
where
    S: CatalogSource + ?Sized,
{
    let categories = source.fetch_categories().await?;
    Ok(aggregate_categories(source, &categories).await)
}

/// Fetch the products of `categories` concurrently and flatten them.
pub async fn aggregate_categories<S>(source: &S, categories: &[CategoryEntry]) -> Aggregation
where
    S: CatalogSource + ?Sized,
{
    let fetches = categories.iter().map(|category| async move {
        let result = source.fetch_category_products(&category.slug).await;
        (category, result)
    });

    let mut entries = Vec::new();
    let mut failed = Vec::new();

    for (category, result) in join_all(fetches).await {
        match result {
            Ok(products) => {
                entries.extend(products.into_iter().map(|p| p.tagged(category)));
            }
            Err(e) => {
                warn!(category = %category.name, slug = %category.slug, error = %e,
                    "category products failed to load; skipping");
                failed.push(category.slug.clone());
            }
        }
    }

    debug!(
        categories = categories.len(),
        failed = failed.len(),
        entries = entries.len(),
        "catalog aggregated"
    );

    Aggregation {
        entries,
        categories: categories.len(),
        failed,
    }
}

/// Build the candidate pool for a session. Never fails.
pub async fn load_candidate_pool<S>(source: &S, fallback: Vec<CatalogEntry>) -> CandidatePool
where
    S: CatalogSource + ?Sized,
{
    candidate_pool(aggregate_catalog(source).await, fallback)
}

/// Apply the fallback rule to a finished aggregation pass.
///
/// Lets callers fetch the fallback list concurrently with the pass.
pub fn candidate_pool(
    aggregated: Result<Aggregation, FetchError>,
    fallback: Vec<CatalogEntry>,
) -> CandidatePool {
    match aggregated {
        Ok(agg) => CandidatePool {
            entries: agg.entries,
            origin: PoolOrigin::Catalog {
                categories: agg.categories,
                failed_categories: agg.failed.len(),
            },
        },
        Err(e) => {
            warn!(error = %e, fallback = fallback.len(), "category list failed; using fallback pool");
            CandidatePool {
                entries: fallback,
                origin: PoolOrigin::Fallback {
                    advisory: FALLBACK_ADVISORY.to_string(),
                    reason: e.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::InMemoryCatalog;
    use crate::models::Price;

    fn category(slug: &str, name: &str) -> CategoryEntry {
        CategoryEntry {
            id: slug.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            image_url: None,
            description: None,
            product_count: None,
        }
    }

    fn product(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            price: Price::Amount(1.0),
            original_price: None,
            slug: id.to_string(),
            image_url: None,
            category: None,
        }
    }

    fn three_categories() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_category(
                category("valorant", "Valorant"),
                vec![product("v1", "475 VP"), product("v2", "1000 VP")],
            )
            .with_category(category("pubg", "PUBG Mobile"), vec![product("p1", "60 UC")])
            .with_category(category("steam", "Steam"), vec![product("s1", "Wallet 50")])
    }

    #[tokio::test]
    async fn test_flattens_in_category_order_and_tags() {
        let source = three_categories();
        let agg = aggregate_catalog(&source).await.unwrap();

        let ids: Vec<&str> = agg.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "p1", "s1"]);
        assert_eq!(agg.entries[2].category_name(), Some("PUBG Mobile"));
        assert_eq!(agg.entries[2].category_slug(), Some("pubg"));
        assert_eq!(agg.categories, 3);
        assert!(agg.failed.is_empty());
        assert_eq!(source.product_fetches(), 3);
    }

    #[tokio::test]
    async fn test_one_failed_category_keeps_the_rest() {
        let source = three_categories().fail_category("pubg");
        let agg = aggregate_catalog(&source).await.unwrap();

        let ids: Vec<&str> = agg.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "s1"]);
        assert_eq!(agg.failed, vec!["pubg".to_string()]);
    }

    #[tokio::test]
    async fn test_category_list_failure_uses_fallback() {
        let source = three_categories().fail_categories();
        let fallback = vec![product("f1", "Featured Item")];
        let pool = load_candidate_pool(&source, fallback.clone()).await;

        assert!(pool.is_degraded());
        assert_eq!(pool.entries, fallback);
        assert_eq!(pool.advisory(), Some(FALLBACK_ADVISORY));
        assert_eq!(source.product_fetches(), 0);
    }

    #[tokio::test]
    async fn test_healthy_pool_has_no_advisory() {
        let source = three_categories().fail_category("steam");
        let pool = load_candidate_pool(&source, Vec::new()).await;

        assert!(!pool.is_degraded());
        assert!(pool.advisory().is_none());
        assert_eq!(
            pool.origin,
            PoolOrigin::Catalog {
                categories: 3,
                failed_categories: 1
            }
        );
        assert_eq!(pool.entries.len(), 3);
    }

    #[test]
    fn test_candidate_pool_keeps_fallback_only_on_error() {
        let fallback = vec![product("f1", "Featured Item")];
        let agg = Aggregation {
            entries: vec![product("v1", "475 VP")],
            categories: 1,
            failed: Vec::new(),
        };
        let pool = candidate_pool(Ok(agg), fallback.clone());
        assert_eq!(pool.entries.len(), 1);
        assert_eq!(pool.entries[0].id, "v1");

        let pool = candidate_pool(Err(FetchError::Network("down".to_string())), fallback);
        assert!(pool.is_degraded());
        assert_eq!(pool.entries[0].id, "f1");
        match pool.origin {
            PoolOrigin::Fallback { reason, .. } => assert!(reason.contains("down")),
            other => panic!("expected fallback origin, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_category_list() {
        let source = InMemoryCatalog::new();
        let agg = aggregate_catalog(&source).await.unwrap();
        assert!(agg.entries.is_empty());
        assert_eq!(agg.categories, 0);
    }
}
