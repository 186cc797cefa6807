//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (WIKISTACK_*)
//! 2. TOML config file (if WIKISTACK_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// MediaWiki-compatible API endpoint.
    ///
    /// Set via WIKISTACK_API_URL environment variable.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Value for the cross-origin allowance parameter appended to every API
    /// call (`origin=`). Empty string disables the parameter.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to the SQLite durable store.
    ///
    /// Set via WIKISTACK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding precomputed snapshot files, consulted before the
    /// durable store. Ignored when `static_enabled` is false.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Whether to consult the static snapshot tier at all.
    #[serde(default = "default_true")]
    pub static_enabled: bool,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first failed attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff between retries in milliseconds, doubled each attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// TTL for raw API responses in seconds.
    #[serde(default = "default_raw_ttl_secs")]
    pub raw_ttl_secs: i64,

    /// Soft cap on durable-store records; oldest-touched pruned beyond it.
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    /// Classify a section as reference-like when its heading matches the
    /// canonical names.
    #[serde(default = "default_true")]
    pub collapse_by_heading: bool,

    /// Classify a section as reference-like when its body looks like a
    /// references block.
    #[serde(default = "default_true")]
    pub collapse_by_heuristic: bool,

    /// Footnote-style markers needed before the structural heuristic fires.
    #[serde(default = "default_ref_marker_threshold")]
    pub ref_marker_threshold: usize,

    /// Optional allowlist of section index tokens; when set and no fragment
    /// was requested, only these sections are fetched.
    #[serde(default)]
    pub section_allowlist: Option<Vec<String>>,
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}

fn default_origin() -> String {
    "*".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wikistack-cache.sqlite")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_user_agent() -> String {
    "wikistack/0.1".into()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    400
}

fn default_raw_ttl_secs() -> i64 {
    6 * 60 * 60
}

fn default_max_cache_entries() -> usize {
    400
}

fn default_ref_marker_threshold() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            origin: default_origin(),
            db_path: default_db_path(),
            static_dir: default_static_dir(),
            static_enabled: true,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            raw_ttl_secs: default_raw_ttl_secs(),
            max_cache_entries: default_max_cache_entries(),
            collapse_by_heading: true,
            collapse_by_heuristic: true,
            ref_marker_threshold: default_ref_marker_threshold(),
            section_allowlist: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base retry backoff as Duration.
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WIKISTACK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WIKISTACK_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
