//! # Storefront Search CLI (`shop-search`)
//!
//! The `shop-search` binary searches a storefront's catalog from the
//! command line, browses categories, drives the interactive search overlay,
//! and serves ranked search over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! shop-search --config ./config/shop.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shop-search search "<query>"` | Aggregate the catalog and print ranked hits |
//! | `shop-search categories` | List categories |
//! | `shop-search category <slug>` | Show one page of a category's products |
//! | `shop-search interactive` | Debounced, keyboard-driven search overlay |
//! | `shop-search serve` | Start the JSON search service |
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use storefront_search::{categories, config, interactive, search, server};

/// Storefront Search CLI: catalog-wide product search for a storefront API.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shop.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shop-search",
    about = "Storefront Search: catalog-wide product search for a storefront API",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shop.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Search every category's products for a query.
    ///
    /// Fetches all categories and their products concurrently, then ranks
    /// by exact name, name prefix, and substring match. If the category
    /// list is unavailable, featured items are searched instead.
    Search {
        /// Search query (case-insensitive).
        query: String,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List categories.
    Categories,

    /// Show a category and one page of its products.
    Category {
        /// Category slug.
        slug: String,

        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Interactive search overlay on stdin.
    ///
    /// Plain lines are search input; `:up`, `:down`, `:enter`, `:esc`
    /// drive the result list.
    Interactive,

    /// Start the JSON search service.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Categories => {
            categories::run_categories(&cfg).await?;
        }
        Commands::Category { slug, page } => {
            categories::run_category(&cfg, &slug, page).await?;
        }
        Commands::Interactive => {
            interactive::run_interactive(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
