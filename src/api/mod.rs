//! NeoDB catalog API client.
//!
//! - [`ApiClient::fetch_one`] - `GET {base}/podcast/episode/{uuid}` with a
//!   per-attempt timeout and a bounded retry budget
//! - [`ApiClient::fetch_many`] - concurrent fan-out over many identifiers with
//!   one isolated [`FetchOutcome`](crate::gallery::FetchOutcome) per identifier
//!
//! # Example
//!
//! ```ignore
//! use podcast_gallery::api::{ApiClient, ApiConfig};
//!
//! let client = ApiClient::new(ApiConfig {
//!     base_url: Some("https://neodb.social/api".into()),
//!     ..ApiConfig::default()
//! })?;
//! let outcomes = client.fetch_many(&["4f1c…", "9a2e…"]).await;
//! ```

mod client;

pub use client::{
    ApiClient, ApiConfig, ApiError, Payload, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT,
};
