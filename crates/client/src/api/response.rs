//! Serde types for the MediaWiki API response shapes this client consumes.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Response body for `action=query` title/revision lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<QueryBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub normalized: Vec<TitleMapping>,
    #[serde(default)]
    pub redirects: Vec<TitleMapping>,
    #[serde(default)]
    pub pages: HashMap<String, PageInfo>,
}

/// One normalization or redirect step reported by the query API.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleMapping {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Present (as an empty marker) when the page does not exist.
    #[serde(default)]
    pub missing: Option<Value>,
    /// Present when the requested title is syntactically invalid.
    #[serde(default)]
    pub invalid: Option<Value>,
    #[serde(default)]
    pub lastrevid: Option<u64>,
    #[serde(default)]
    pub fullurl: Option<String>,
    #[serde(default)]
    pub revisions: Vec<RevisionInfo>,
    #[serde(default)]
    pub pageprops: Option<PageProps>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionInfo {
    #[serde(default)]
    pub revid: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageProps {
    #[serde(default)]
    pub disambiguation: Option<Value>,
}

/// Response body for `action=parse` calls (section list and section text).
#[derive(Debug, Clone, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub parse: Option<ParseBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseBody {
    #[serde(default)]
    pub sections: Vec<SectionDescriptor>,
    #[serde(default)]
    pub text: Option<ParseText>,
    #[serde(default)]
    pub revid: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseText {
    #[serde(rename = "*", default)]
    pub content: Option<String>,
}

/// One content subsection without its body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionDescriptor {
    /// Opaque position token; not necessarily numeric-contiguous.
    #[serde(default)]
    pub index: String,
    #[serde(rename = "line", default)]
    pub heading: String,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(rename = "toclevel", default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

/// Canonical identity of a resolved page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Canonical, redirect-resolved title.
    pub title: String,
    pub canonical_url: Option<String>,
    /// Opaque revision marker; the pipeline's sole freshness signal.
    pub last_revision: Option<String>,
    /// RFC3339 timestamp of the latest revision.
    pub last_updated_at: Option<String>,
    pub is_disambiguation: bool,
    pub is_missing: bool,
}

/// HTML body of one section together with the revision it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHtml {
    pub html: String,
    pub revision: Option<String>,
}
