//! One-shot catalog search (`shop-search search`).
//!
//! Opens a search session, waits for the aggregation pass, ranks the query
//! once, and prints the hits.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use storefront_search_core::catalog::CatalogSource;
use storefront_search_core::listing::format_price;
use storefront_search_core::matcher::highlight;
use storefront_search_core::models::{product_route, CatalogEntry};

use crate::api::HttpCatalog;
use crate::config::{Config, SearchConfig};
use crate::session::{LoadStatus, RouteNavigator, SearchSession, SessionOptions};

/// Logs confirmed routes; used where no UI router exists.
pub struct LogRouter;

impl RouteNavigator for LogRouter {
    fn navigate_to(&self, route: &str) {
        info!(%route, "navigate");
    }
}

/// Outcome of a one-shot search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<CatalogEntry>,
    pub status: LoadStatus,
    pub advisory: Option<String>,
}

/// Run one search against `source`: load the pool, rank, close.
pub async fn search_once(
    source: Arc<dyn CatalogSource>,
    config: &SearchConfig,
    query: &str,
) -> SearchOutcome {
    let session = SearchSession::open_with_featured(
        source,
        config.fallback_limit,
        Arc::new(LogRouter),
        SessionOptions::from_config(config),
    );
    session.wait_loaded().await;

    let results = session.evaluate_now(query);
    let snapshot = session.snapshot();
    session.close();

    SearchOutcome {
        results,
        status: snapshot.status,
        advisory: snapshot.advisory,
    }
}

/// CLI entry point.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let source: Arc<dyn CatalogSource> = Arc::new(HttpCatalog::new(&config.api)?);
    let outcome = search_once(source, &config.search, query).await;

    if let Some(ref advisory) = outcome.advisory {
        eprintln!("Note: {}", advisory);
    }

    if outcome.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let limit = limit.unwrap_or(config.search.max_results);
    println!("{} results", outcome.results.len());
    println!();
    for (i, entry) in outcome.results.iter().take(limit).enumerate() {
        print_entry(i + 1, entry, query, &config.search.product_route);
    }

    Ok(())
}

/// Print one hit with the matched parts of the name in brackets.
pub fn print_entry(position: usize, entry: &CatalogEntry, query: &str, route_template: &str) {
    let mut price = format_price(&entry.price);
    if let Some(ref original) = entry.original_price {
        price.push_str(&format!(" (was {})", format_price(original)));
    }

    println!("{}. {}  {}", position, mark(&entry.name, query), price);
    if let Some(category) = entry.category_name() {
        println!("    category: {}", mark(category, query));
    }
    println!("    route: {}", product_route(route_template, entry));
    println!("    id: {}", entry.id);
    println!();
}

/// Render `text` with every match of `query` wrapped in `[...]`.
pub fn mark(text: &str, query: &str) -> String {
    highlight(text, query)
        .into_iter()
        .map(|segment| {
            if segment.matched {
                format!("[{}]", segment.text)
            } else {
                segment.text.to_string()
            }
        })
        .collect()
}
