//! Resilient JSON fetch layer.
//!
//! Every outbound API call goes through here:
//! - per-call timeout, bounded retries with exponential backoff
//! - read-through raw-response cache keyed by the serialized request
//!   parameters (independent of the endpoint URL)
//! - an application-level error in an otherwise valid response is final:
//!   never retried, never cached

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wikistack_core::cache::keys::raw_request_key;
use wikistack_core::{AppConfig, CacheTiers, Error};

/// Configuration for the request client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// MediaWiki-compatible API endpoint.
    pub api_url: String,

    /// Cross-origin allowance parameter value; empty disables it.
    pub origin: String,

    /// User agent string (default: "wikistack/0.1").
    pub user_agent: String,

    /// Per-call timeout (default: 15s).
    pub timeout: Duration,

    /// Retries after the first failed attempt (default: 2).
    pub retries: u32,

    /// Base backoff between retries, doubled each attempt (default: 400ms).
    pub backoff: Duration,

    /// TTL for cached raw responses (default: 6h).
    pub raw_ttl_secs: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            origin: "*".to_string(),
            user_agent: "wikistack/0.1".to_string(),
            timeout: Duration::from_millis(15_000),
            retries: 2,
            backoff: Duration::from_millis(400),
            raw_ttl_secs: 6 * 60 * 60,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            origin: config.origin.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            retries: config.retries,
            backoff: config.backoff(),
            raw_ttl_secs: config.raw_ttl_secs,
        }
    }
}

/// Extract the remote's own error message from a structurally valid
/// response carrying a top-level `error` object.
pub fn remote_error(value: &Value) -> Option<String> {
    let err = value.get("error")?;
    let msg = err
        .get("info")
        .and_then(Value::as_str)
        .or_else(|| err.get("code").and_then(Value::as_str))
        .unwrap_or("remote API error");
    Some(msg.to_string())
}

/// JSON request client with timeout, retry, and response caching.
pub struct RequestClient {
    http: reqwest::Client,
    config: FetchConfig,
    cache: Arc<CacheTiers>,
}

impl RequestClient {
    /// Create a new request client with the given configuration.
    pub fn new(config: FetchConfig, cache: Arc<CacheTiers>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, cache })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issue a JSON API call through the raw-response cache.
    ///
    /// A cache hit within the TTL short-circuits the network entirely; a
    /// successful live response is cached after retries succeed, never on a
    /// failed attempt or a remote-reported error.
    pub async fn request_json(&self, params: &[(&str, &str)]) -> Result<Value, Error> {
        let query = serialize_params(params);
        let key = raw_request_key(&query);

        if let Some(payload) = self.cache.raw_get(&key, self.config.raw_ttl_secs).await {
            match serde_json::from_str(&payload) {
                Ok(value) => {
                    tracing::debug!("raw cache hit for {query}");
                    return Ok(value);
                }
                Err(e) => tracing::debug!("discarding unreadable raw cache entry: {e}"),
            }
        }

        let value = self.fetch_with_retry(&query).await?;
        if let Some(msg) = remote_error(&value) {
            return Err(Error::Remote(msg));
        }

        self.cache.raw_put(&key, &value.to_string()).await;
        Ok(value)
    }

    /// Issue a JSON API call bypassing the raw-response cache.
    ///
    /// Used for one-shot calls like typo-correction suggestions.
    pub async fn request_json_uncached(&self, params: &[(&str, &str)]) -> Result<Value, Error> {
        let query = serialize_params(params);
        let value = self.fetch_with_retry(&query).await?;
        if let Some(msg) = remote_error(&value) {
            return Err(Error::Remote(msg));
        }
        Ok(value)
    }

    async fn fetch_with_retry(&self, query: &str) -> Result<Value, Error> {
        let url = if self.config.origin.is_empty() {
            format!("{}?{}", self.config.api_url, query)
        } else {
            format!("{}?{}&origin={}", self.config.api_url, query, self.config.origin)
        };

        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    let delay = self.config.backoff * 2u32.pow(attempt);
                    tracing::debug!("attempt {} failed ({e}); retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Value, Error> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("no response within {:?}", self.config.timeout))
                } else {
                    Error::Transport(format!("network error: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("no response within {:?}", self.config.timeout))
            } else {
                Error::Transport(format!("failed to read response: {e}"))
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|e| Error::Parse(format!("invalid JSON body: {e}")))
    }
}

/// Serialize request parameters to a canonical query string. This string is
/// also the raw-cache identity of the request.
pub fn serialize_params(params: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_params_stability() {
        let a = serialize_params(&[("action", "query"), ("titles", "Example Page")]);
        let b = serialize_params(&[("action", "query"), ("titles", "Example Page")]);
        assert_eq!(a, b);
        assert!(a.contains("action=query"));
        assert!(a.contains("titles=Example+Page"));
    }

    #[test]
    fn test_serialize_params_order_sensitive() {
        let a = serialize_params(&[("action", "query"), ("titles", "A")]);
        let b = serialize_params(&[("titles", "A"), ("action", "query")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remote_error_extraction() {
        let value: Value =
            serde_json::from_str(r#"{"error":{"code":"missingtitle","info":"The page does not exist."}}"#).unwrap();
        assert_eq!(remote_error(&value).as_deref(), Some("The page does not exist."));

        let code_only: Value = serde_json::from_str(r#"{"error":{"code":"badtitle"}}"#).unwrap();
        assert_eq!(remote_error(&code_only).as_deref(), Some("badtitle"));

        let clean: Value = serde_json::from_str(r#"{"query":{"pages":{}}}"#).unwrap();
        assert!(remote_error(&clean).is_none());
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(15_000));
        assert_eq!(config.retries, 2);
        assert_eq!(config.backoff, Duration::from_millis(400));
        assert_eq!(config.raw_ttl_secs, 21_600);
    }

    #[tokio::test]
    async fn test_request_client_new() {
        let cache = Arc::new(wikistack_core::CacheTiers::in_memory(None));
        let client = RequestClient::new(FetchConfig::default(), cache);
        assert!(client.is_ok());
    }
}
