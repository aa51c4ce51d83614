//! Configuration file parser for `podcast-gallery.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings since they are
//! usually typos. `NEODB_API_BASE`, `NEODB_API_TOKEN` and `PODCAST_UUIDS`
//! override the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::{ApiConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
use crate::gallery::{parse_allow_list, DESCRIPTION_LIMIT};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "podcast-gallery.toml";

pub const ENV_API_BASE: &str = "NEODB_API_BASE";
pub const ENV_API_TOKEN: &str = "NEODB_API_TOKEN";
pub const ENV_PODCAST_UUIDS: &str = "PODCAST_UUIDS";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Build configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// SEC-015: Custom Debug impl masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog API base URL, e.g. `https://neodb.social/api`
    pub api_base: Option<String>,

    /// Bearer token for the catalog API
    pub api_token: Option<String>,

    /// Comma-separated allow-list restricting and ordering the curated list
    pub podcast_uuids: Option<String>,

    /// Per-attempt request timeout in milliseconds
    pub timeout_ms: u64,

    /// Total attempts per request, including the first; values above the
    /// default are lowered to it
    pub max_attempts: u32,

    /// Curated list JSON file
    pub curated_path: PathBuf,

    /// Directory receiving `index.html` and audit reports
    pub output_dir: PathBuf,

    /// Page template; the built-in template is used when unset
    pub template_path: Option<PathBuf>,

    /// SQLite metadata cache; no caching when unset
    pub cache_path: Option<PathBuf>,

    /// Character budget for collapsed descriptions
    pub description_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            api_token: None,
            podcast_uuids: None,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            curated_path: PathBuf::from("data/podcasts.json"),
            output_dir: PathBuf::from("dist"),
            template_path: None,
            cache_path: None,
            description_limit: DESCRIPTION_LIMIT,
        }
    }
}

/// SEC-015: Mask api_token in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("podcast_uuids", &self.podcast_uuids)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_attempts", &self.max_attempts)
            .field("curated_path", &self.curated_path)
            .field("output_dir", &self.output_dir)
            .field("template_path", &self.template_path)
            .field("cache_path", &self.cache_path)
            .field("description_limit", &self.description_limit)
            .finish()
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "api_base",
        "api_token",
        "podcast_uuids",
        "timeout_ms",
        "max_attempts",
        "curated_path",
        "output_dir",
        "template_path",
        "cache_path",
        "description_limit",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - `timeout_ms = 0` → `Err(ConfigError::Invalid)`
    /// - `max_attempts` outside `1..=2` → clamped, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config = toml::from_str::<Config>(&content)?.validated()?;
        tracing::info!(
            path = %path.display(),
            curated = %config.curated_path.display(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        let attempts = self.max_attempts.clamp(1, DEFAULT_MAX_ATTEMPTS);
        if attempts != self.max_attempts {
            tracing::warn!(
                configured = self.max_attempts,
                using = attempts,
                "max_attempts out of range, clamping"
            );
            self.max_attempts = attempts;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`. Unset or blank variables are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(base) = get(ENV_API_BASE) {
            self.api_base = Some(base);
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(uuids) = get(ENV_PODCAST_UUIDS) {
            self.podcast_uuids = Some(uuids);
        }
        self
    }

    /// Parsed allow-list; empty when unset.
    pub fn allow_list(&self) -> Vec<String> {
        self.podcast_uuids
            .as_deref()
            .map(parse_allow_list)
            .unwrap_or_default()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base.clone(),
            token: self
                .api_token
                .as_deref()
                .map(|token| SecretString::from(token.to_owned())),
            timeout: Duration::from_millis(self.timeout_ms),
            max_attempts: self.max_attempts.clamp(1, DEFAULT_MAX_ATTEMPTS),
            ..ApiConfig::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
