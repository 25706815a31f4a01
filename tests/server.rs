//! HTTP search service tests against an in-memory catalog.

use std::sync::Arc;

use serde_json::Value;
use storefront_search::config::{parse_config, Config};
use storefront_search::server::run_server_with_source;
use storefront_search_core::catalog::memory::InMemoryCatalog;
use storefront_search_core::catalog::CatalogSource;
use storefront_search_core::models::{CatalogEntry, CategoryEntry, Price};

// ─── Fixtures ───────────────────────────────────────────────────────

fn test_config(port: u16) -> Config {
    parse_config(&format!(
        r#"
[api]
base_url = "http://127.0.0.1:9"

[listing]
per_page = 2

[server]
bind = "127.0.0.1:{}"
"#,
        port
    ))
    .unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

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

fn product(id: &str, name: &str, price: f64) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        name: name.to_string(),
        price: Price::Amount(price),
        original_price: None,
        slug: format!("p-{}", id),
        image_url: None,
        category: None,
    }
}

fn storefront() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_category(
            category("valorant", "Valorant"),
            vec![
                product("1", "Valorant Points 1000", 250.0),
                product("2", "Valorant", 100.0),
                product("3", "Radiant Points", 1234.56),
            ],
        )
        .with_category(
            category("steam", "Steam"),
            vec![product("4", "Steam Wallet", 50.0)],
        )
}

async fn start(source: Arc<dyn CatalogSource>) -> u16 {
    let port = find_free_port();
    let cfg = test_config(port);
    tokio::spawn(async move {
        run_server_with_source(&cfg, source).await.ok();
    });
    wait_for_server(port).await;
    port
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_pool() {
    let port = start(Arc::new(storefront())).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pool"]["entries"], 4);
    assert_eq!(body["pool"]["origin"]["kind"], "catalog");
    assert_eq!(body["pool"]["origin"]["categories"], 2);
}

#[tokio::test]
async fn test_search_ranks_exact_then_prefix_then_substring() {
    let port = start(Arc::new(storefront())).await;

    let url = format!(
        "http://127.0.0.1:{}/search?q=VALORANT&explain=true",
        port
    );
    let body: Value = reqwest::get(url).await.unwrap().json().await.unwrap();

    // "Radiant Points" matches through its category name only.
    assert_eq!(body["total"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["name"], "Valorant");
    assert_eq!(results[0]["tier"], "exact");
    assert_eq!(results[0]["route"], "/product-detail/p-2");
    assert_eq!(results[1]["name"], "Valorant Points 1000");
    assert_eq!(results[1]["tier"], "prefix");
    assert_eq!(results[1]["category"], "Valorant");
    assert_eq!(results[2]["name"], "Radiant Points");
    assert_eq!(results[2]["tier"], "other");
    assert!(body.get("advisory").is_none());
}

#[tokio::test]
async fn test_search_matches_category_name_and_limits() {
    let port = start(Arc::new(storefront())).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://127.0.0.1:{}/search", port))
        .query(&[("q", "points"), ("limit", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert!(body["results"][0].get("tier").is_none());

    let body: Value = client
        .get(format!("http://127.0.0.1:{}/search?q=radiant", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["results"][0]["price"], "₺1.234,56");
}

#[tokio::test]
async fn test_search_empty_query_and_bad_limit() {
    let port = start(Arc::new(storefront())).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/search?q=%20", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 0);
    assert!(body["results"].as_array().unwrap().is_empty());

    let resp = reqwest::get(format!("http://127.0.0.1:{}/search?q=a&limit=0", port))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_degraded_pool_carries_advisory() {
    let source = storefront()
        .with_featured(vec![product("f1", "Featured Valorant Card", 10.0)])
        .fail_categories();
    let port = start(Arc::new(source)).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/search?q=valorant", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["id"], "f1");
    assert_eq!(
        body["advisory"],
        "Products could not be loaded. Showing featured items instead."
    );

    // The live category list is still an upstream failure.
    let resp = reqwest::get(format!("http://127.0.0.1:{}/categories", port))
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "upstream");
}

#[tokio::test]
async fn test_categories_and_category_page() {
    let port = start(Arc::new(storefront())).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/categories", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slugs: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["valorant", "steam"]);

    let body: Value = reqwest::get(format!(
        "http://127.0.0.1:{}/categories/valorant?page=2",
        port
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(body["category"]["name"], "Valorant");
    assert_eq!(body["products"]["page"], 2);
    assert_eq!(body["products"]["total_pages"], 2);
    assert_eq!(body["products"]["items"].as_array().unwrap().len(), 1);

    let resp = reqwest::get(format!("http://127.0.0.1:{}/categories/nope", port))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_reload_refetches_catalog() {
    let catalog = Arc::new(storefront());
    let source: Arc<dyn CatalogSource> = catalog.clone();
    let port = start(source).await;
    assert_eq!(catalog.product_fetches(), 2);

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/reload", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["entries"], 4);
    assert_eq!(catalog.product_fetches(), 4);
}
