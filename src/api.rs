//! HTTP client for the storefront REST API.
//!
//! Implements [`CatalogSource`] over `reqwest`.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET` | `/categories` | `{ "data": [Category] }` |
//! | `GET` | `/categories/{slug}` | `{ "data": Category }` |
//! | `GET` | `/categories/{slug}/products` | `{ "data": [Product] }` |
//! | `GET` | `/homepage-items?limit={n}` | `{ "data": [Product] }` |
//!
//! A missing or `null` `data` field reads as an empty list. Requests are
//! never retried; a failure is reported once and the caller decides how
//! to degrade.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use storefront_search_core::catalog::{CatalogSource, FetchError};
use storefront_search_core::models::{CatalogEntry, CategoryEntry};

use crate::config::ApiConfig;

/// Response envelope used by every storefront endpoint.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Catalog backed by the storefront REST API.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the `data` envelope.
    ///
    /// Returns `Ok(None)` for a 404 so callers can tell "absent" from
    /// "failed".
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<Envelope<T>>, FetchError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let envelope = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))?;
        Ok(Some(envelope))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        match self.get_envelope::<Vec<T>>(path).await? {
            Some(envelope) => Ok(envelope.data.unwrap_or_default()),
            None => Err(FetchError::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch_categories(&self) -> Result<Vec<CategoryEntry>, FetchError> {
        self.get_list("/categories").await
    }

    async fn fetch_category(&self, slug: &str) -> Result<Option<CategoryEntry>, FetchError> {
        let path = category_path(slug);
        Ok(self
            .get_envelope::<CategoryEntry>(&path)
            .await?
            .and_then(|envelope| envelope.data))
    }

    async fn fetch_category_products(&self, slug: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        self.get_list(&format!("{}/products", category_path(slug)))
            .await
    }

    async fn fetch_featured(&self, limit: usize) -> Result<Vec<CatalogEntry>, FetchError> {
        self.get_list(&format!("/homepage-items?limit={}", limit))
            .await
    }
}

/// Path of a category resource; the slug is percent-encoded as one segment.
fn category_path(slug: &str) -> String {
    format!("/categories/{}", urlencoding::encode(slug))
}
