//! # Storefront Search
//!
//! Catalog-wide product search for a storefront REST API.
//!
//! The storefront exposes products only per category, so search first
//! aggregates every category's products into one candidate pool, then
//! ranks that pool against each (debounced) query. A failed category is
//! skipped; a failed category list degrades to featured items with an
//! advisory.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────────┐
//! │ Storefront   │──▶│ Aggregation │──▶│ Candidate pool │
//! │ API (HTTP)   │   │ (parallel)  │   │                │
//! └──────────────┘   └─────────────┘   └───────┬───────┘
//!                                              │
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!             ┌─────────────────┐        ┌──────────┐
//!             │ SearchSession   │        │   HTTP   │
//!             │ debounce + keys │        │ service  │
//!             └─────────────────┘        └──────────┘
//! ```
//!
//! The runtime-agnostic parts (models, matcher, navigator, aggregation,
//! pagination) live in `storefront-search-core`.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`api`] | HTTP client for the storefront API |
//! | [`debounce`] | Trailing-edge debouncer |
//! | [`session`] | Search overlay session |
//! | [`search`] | One-shot search command |
//! | [`categories`] | Category browsing commands |
//! | [`interactive`] | Line-driven search overlay |
//! | [`server`] | JSON search service |

pub mod api;
pub mod categories;
pub mod config;
pub mod debounce;
pub mod interactive;
pub mod search;
pub mod server;
pub mod session;
