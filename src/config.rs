//! TOML configuration.
//!
//! ```toml
//! [api]
//! base_url = "https://shop.example.com/api"
//! timeout_secs = 10
//!
//! [search]
//! debounce_ms = 250
//! fallback_limit = 20
//! product_route = "/product-detail/{slug}"
//! max_results = 50
//!
//! [listing]
//! per_page = 12
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! Only `[api].base_url` is required; every other key has a default.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Quiet interval before a keystroke is evaluated.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Number of featured items fetched as the fallback pool.
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
    /// Route opened when a result is confirmed; `{slug}` is substituted.
    #[serde(default = "default_product_route")]
    pub product_route: String,
    /// Display cap for the CLI and the HTTP service.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            fallback_limit: default_fallback_limit(),
            product_route: default_product_route(),
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    250
}
fn default_fallback_limit() -> usize {
    20
}
fn default_product_route() -> String {
    "/product-detail/{slug}".to_string()
}
fn default_max_results() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

fn default_per_page() -> usize {
    storefront_search_core::listing::DEFAULT_PER_PAGE
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate api
    let base = config.api.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("api.base_url must start with http:// or https://");
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    // Validate search
    if config.search.debounce_ms == 0 {
        anyhow::bail!("search.debounce_ms must be > 0");
    }
    if !config.search.product_route.contains("{slug}") {
        anyhow::bail!("search.product_route must contain '{{slug}}'");
    }
    if config.search.max_results < 1 {
        anyhow::bail!("search.max_results must be >= 1");
    }

    // Validate listing
    if config.listing.per_page < 1 {
        anyhow::bail!("listing.per_page must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = parse_config(
            r#"
[api]
base_url = "https://shop.example.com/api"
"#,
        )
        .unwrap();
        assert_eq!(cfg.api.timeout_secs, 10);
        assert_eq!(cfg.search.debounce(), Duration::from_millis(250));
        assert_eq!(cfg.search.fallback_limit, 20);
        assert_eq!(cfg.search.product_route, "/product-detail/{slug}");
        assert_eq!(cfg.listing.per_page, 12);
        assert_eq!(cfg.server.bind, "127.0.0.1:7340");
    }

    #[test]
    fn test_overrides() {
        let cfg = parse_config(
            r#"
[api]
base_url = "http://localhost:8080"
timeout_secs = 3

[search]
debounce_ms = 100
product_route = "/epin/{slug}"
max_results = 5

[listing]
per_page = 24
"#,
        )
        .unwrap();
        assert_eq!(cfg.api.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.search.debounce_ms, 100);
        assert_eq!(cfg.search.product_route, "/epin/{slug}");
        assert_eq!(cfg.search.max_results, 5);
        assert_eq!(cfg.listing.per_page, 24);
    }

    #[test]
    fn test_rejects_invalid() {
        let cases = [
            ("[api]\nbase_url = \"ftp://x\"", "base_url"),
            (
                "[api]\nbase_url = \"http://x\"\n[search]\ndebounce_ms = 0",
                "debounce_ms",
            ),
            (
                "[api]\nbase_url = \"http://x\"\n[search]\nproduct_route = \"/p\"",
                "product_route",
            ),
            (
                "[api]\nbase_url = \"http://x\"\n[listing]\nper_page = 0",
                "per_page",
            ),
        ];
        for (toml_text, field) in cases {
            let err = parse_config(toml_text).unwrap_err().to_string();
            assert!(err.contains(field), "expected {} error, got: {}", field, err);
        }
    }

    #[test]
    fn test_missing_api_section() {
        assert!(parse_config("[search]\ndebounce_ms = 10").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/shop.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("shop.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://shop.example.com/api\"\n[server]\nbind = \"0.0.0.0:8080\"\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }
}
