//! In-memory [`CatalogSource`] for tests and offline demos.
//!
//! Holds categories with their products behind a `std::sync::RwLock`.
//! Individual fetches can be made to fail, which is how the aggregator's
//! failure isolation is exercised.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{CatalogSource, FetchError};
use crate::models::{CatalogEntry, CategoryEntry};

#[derive(Default)]
struct Inner {
    categories: Vec<CategoryEntry>,
    products: HashMap<String, Vec<CatalogEntry>>,
    featured: Vec<CatalogEntry>,
    failing_slugs: HashSet<String>,
    categories_fail: bool,
}

/// In-memory catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Inner>,
    product_fetches: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with its products (appended in call order).
    pub fn with_category(self, category: CategoryEntry, products: Vec<CatalogEntry>) -> Self {
        {
            let mut inner = self.write();
            inner.products.insert(category.slug.clone(), products);
            inner.categories.push(category);
        }
        self
    }

    pub fn with_featured(self, featured: Vec<CatalogEntry>) -> Self {
        self.write().featured = featured;
        self
    }

    /// Make product fetches for `slug` fail with a network error.
    pub fn fail_category(self, slug: &str) -> Self {
        self.write().failing_slugs.insert(slug.to_string());
        self
    }

    /// Make the category list fetch fail with a network error.
    pub fn fail_categories(self) -> Self {
        self.write().categories_fail = true;
        self
    }

    /// Number of `fetch_category_products` calls served so far.
    pub fn product_fetches(&self) -> usize {
        self.product_fetches.load(Ordering::SeqCst)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch_categories(&self) -> Result<Vec<CategoryEntry>, FetchError> {
        let inner = self.read();
        if inner.categories_fail {
            return Err(FetchError::Network("categories unavailable".to_string()));
        }
        Ok(inner.categories.clone())
    }

    async fn fetch_category(&self, slug: &str) -> Result<Option<CategoryEntry>, FetchError> {
        let inner = self.read();
        if inner.categories_fail {
            return Err(FetchError::Network("categories unavailable".to_string()));
        }
        Ok(inner.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn fetch_category_products(&self, slug: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        self.product_fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.read();
        if inner.failing_slugs.contains(slug) {
            return Err(FetchError::Network(format!("products of '{}' unavailable", slug)));
        }
        inner
            .products
            .get(slug)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("category '{}'", slug)))
    }

    async fn fetch_featured(&self, limit: usize) -> Result<Vec<CatalogEntry>, FetchError> {
        let inner = self.read();
        Ok(inner.featured.iter().take(limit).cloned().collect())
    }
}
