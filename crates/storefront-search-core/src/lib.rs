//! # Storefront Search Core
//!
//! Runtime-agnostic logic for the storefront catalog search: data models,
//! the catalog source trait, concurrent catalog aggregation, the ranking
//! matcher, and the keyboard navigator.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. Timers
//! (debouncing) and the HTTP client live in the `storefront-search` crate.

pub mod aggregate;
pub mod catalog;
pub mod listing;
pub mod matcher;
pub mod models;
pub mod navigator;
