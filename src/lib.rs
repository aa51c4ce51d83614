//! Curated podcast gallery builder.
//!
//! Reads a curated list of catalog identifiers, fetches each podcast's
//! metadata from a NeoDB-style API and renders the results as a static page.
//!
//! - [`api`] - catalog client with per-request timeout and bounded retries
//! - [`gallery`] - curated list, card view-models, view state and bootstrap
//! - [`render`] - rendering surfaces (HTML page, in-memory)
//! - [`storage`] - metadata cache over an LRU map or SQLite
//! - [`audit`] - catalog health report for the curated list
//! - [`config`] - TOML configuration with environment overrides

pub mod api;
pub mod audit;
pub mod config;
pub mod gallery;
pub mod render;
pub mod storage;
pub mod util;
