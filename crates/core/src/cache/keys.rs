//! Cache key and slug derivation.

use sha2::{Digest, Sha256};

/// Scope marker used in keys when no fragment was requested.
const WHOLE_PAGE: &str = "ALL";

/// Slugify a string to `[a-z0-9-]`, capped at 128 chars.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out.truncate(128);
    out
}

/// Compose the cache key for a page plus optional fragment scope.
pub fn cache_key(title: &str, fragment: Option<&str>) -> String {
    format!("{}#{}", title, fragment.unwrap_or(WHOLE_PAGE))
}

/// Compose the static snapshot slug for a page plus optional fragment scope.
pub fn cache_slug(title: &str, fragment: Option<&str>) -> String {
    slugify(&format!("{}--{}", title, fragment.unwrap_or("all")))
}

/// Key for a raw API response, derived from the serialized request
/// parameters and independent of the endpoint URL.
pub fn raw_request_key(params: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(params.as_bytes());
    hex::encode(hasher.finalize())
}
