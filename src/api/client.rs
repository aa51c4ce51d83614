use futures::future::join_all;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::gallery::{FetchOutcome, PodcastMetadata};
use crate::util::{validate_base_url, UrlValidationError};

/// Per-attempt timeout applied when the config does not override it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
/// Total attempts per request (first try + one retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Errors returned by the catalog client.
///
/// Variants map onto the failure taxonomy the gallery reports on:
/// configuration and precondition errors never touch the network, transient
/// errors are retried while attempts remain, everything else is permanent.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty or blank identifier; no request is issued
    #[error("UUID is required to fetch podcast metadata")]
    MissingId,
    /// No base URL configured
    #[error("API base URL is not configured. Set NEODB_API_BASE in your environment")]
    NotConfigured,
    /// Base URL failed validation (unparseable, wrong scheme, plain HTTP)
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),
    /// Attempt exceeded the per-request timeout and was cancelled
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
    /// Network-level error (DNS, connection, TLS, body stream)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response; `detail` holds the body as JSON, else text
    #[error("NeoDB request failed with status {status}")]
    Status { status: u16, detail: Option<Payload> },
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body declared JSON but did not parse
    #[error("Invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Offline build found no cached metadata for the identifier
    #[error("No cached metadata for {0}")]
    NotCached(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the failure was a status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body attached to a status error.
    pub fn detail(&self) -> Option<&Payload> {
        match self {
            ApiError::Status { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the request should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::MissingId
            | ApiError::NotConfigured
            | ApiError::InvalidBaseUrl(_)
            | ApiError::ResponseTooLarge(_)
            | ApiError::Decode(_)
            | ApiError::NotCached(_) => false,
        }
    }
}

/// Raw result of a successful catalog request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// HTTP 204, no body
    Empty,
    /// Body served with a JSON content type
    Json(Value),
    /// Any other body, as text
    Text(String),
}

/// Client settings, constructed once at startup.
///
/// SEC-015: Custom Debug impl masks `token`.
#[derive(Clone)]
pub struct ApiConfig {
    /// Catalog base URL; `None` makes every request fail with [`ApiError::NotConfigured`]
    pub base_url: Option<String>,
    /// Bearer token attached to every request when present
    pub token: Option<SecretString>,
    /// Hard timeout per attempt
    pub timeout: Duration,
    /// Total attempts per request, including the first; capped at
    /// [`DEFAULT_MAX_ATTEMPTS`]
    pub max_attempts: u32,
    /// Pause before a retry
    pub retry_backoff: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

/// HTTP client for the catalog API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Creates a client with its own connection pool.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("podcast-gallery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a client on top of an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: ApiConfig) -> Self {
        if config.base_url.as_deref().map_or(true, |b| b.trim().is_empty()) {
            tracing::warn!(
                "NEODB_API_BASE is not defined. API requests will fail until the environment is configured"
            );
        }
        if config.token.is_none() {
            tracing::debug!("No catalog API token configured, requests are unauthenticated");
        }
        Self { http, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Fetches catalog metadata for one identifier.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingId`] - blank `uuid`, no request issued
    /// - [`ApiError::NotConfigured`] / [`ApiError::InvalidBaseUrl`] - no request issued
    /// - [`ApiError::Timeout`] / [`ApiError::Network`] - after the retry budget is spent
    /// - [`ApiError::Status`] - 429/5xx after the retry budget, other non-2xx immediately
    ///
    /// # Retries
    ///
    /// At most `max_attempts` attempts, never more than [`DEFAULT_MAX_ATTEMPTS`]. Only network errors, timeouts, 429 and
    /// 5xx are retried; a 404 costs exactly one request.
    pub async fn fetch_one(&self, uuid: &str) -> Result<Payload, ApiError> {
        let uuid = uuid.trim();
        if uuid.is_empty() {
            return Err(ApiError::MissingId);
        }

        let url = self.endpoint(uuid)?;
        let max_attempts = self.config.max_attempts.clamp(1, DEFAULT_MAX_ATTEMPTS);
        let mut attempt = 1;

        loop {
            match self.attempt(&url).await {
                Ok(payload) => {
                    tracing::debug!(uuid = %uuid, attempt = attempt, "Fetched podcast metadata");
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        uuid = %uuid,
                        attempt = attempt,
                        error = %e,
                        "Retrying catalog request after transient error"
                    );
                    if !self.config.retry_backoff.is_zero() {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches every identifier concurrently.
    ///
    /// Each identifier is its own failure domain: one failure (or timeout)
    /// never cancels or taints the others. Outcomes come back in input order.
    pub async fn fetch_many<S: AsRef<str>>(&self, uuids: &[S]) -> Vec<FetchOutcome> {
        let fetches = uuids.iter().map(|uuid| async move {
            let uuid = uuid.as_ref();
            match self.fetch_one(uuid).await {
                Ok(payload) => FetchOutcome::Fulfilled {
                    uuid: uuid.to_owned(),
                    data: PodcastMetadata::from_payload(uuid, &payload),
                },
                Err(error) => {
                    tracing::warn!(uuid = %uuid, error = %error, "Failed to fetch podcast metadata");
                    FetchOutcome::Rejected {
                        uuid: uuid.to_owned(),
                        error,
                    }
                }
            }
        });

        join_all(fetches).await
    }

    fn endpoint(&self, uuid: &str) -> Result<Url, ApiError> {
        let base = match self.config.base_url.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => base,
            _ => return Err(ApiError::NotConfigured),
        };
        let mut url = validate_base_url(base)?;

        // validate_base_url guarantees an http(s) URL, which can always be a base
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["podcast", "episode", uuid]);
        }
        Ok(url)
    }

    async fn attempt(&self, url: &Url) -> Result<Payload, ApiError> {
        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json");

        if let Some(token) = &self.config.token {
            tracing::trace!("Catalog API authentication configured");
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        // Dropping the future on timeout cancels the in-flight request
        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, async move {
            let response = request.send().await?;
            read_payload(response).await
        })
        .await
        .map_err(|_| ApiError::Timeout(timeout.as_millis() as u64))?
    }
}

async fn read_payload(response: reqwest::Response) -> Result<Payload, ApiError> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if !status.is_success() {
        let detail = read_limited_bytes(response, MAX_RESPONSE_SIZE)
            .await
            .ok()
            .and_then(|bytes| decode_detail(&bytes));
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Payload::Empty);
    }

    let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
    if is_json {
        Ok(Payload::Json(serde_json::from_slice(&bytes)?))
    } else {
        Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Error bodies are parsed as JSON when possible, else kept as text.
fn decode_detail(bytes: &[u8]) -> Option<Payload> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Some(Payload::Json(value)),
        Err(_) => Some(Payload::Text(String::from_utf8_lossy(bytes).into_owned())),
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
