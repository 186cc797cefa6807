//! MediaWiki API client.
//!
//! Wraps the resilient fetch layer with the four calls the pipeline uses:
//! title/redirect/revision lookup, typo-correction search, section list, and
//! section body. All calls are query-string driven and answer JSON.

pub mod response;

pub use response::{ResolvedIdentity, SectionDescriptor, SectionHtml};

use response::{ParseResponse, QueryResponse};
use wikistack_core::Error;

use crate::fetch::RequestClient;

/// Typed client over the MediaWiki-compatible API.
pub struct WikiClient {
    request: RequestClient,
}

impl WikiClient {
    /// Create a client over an already-configured request layer.
    pub fn new(request: RequestClient) -> Self {
        Self { request }
    }

    /// Resolve a raw, possibly redirect-prone title to its canonical
    /// identity: title, URL, revision marker, timestamps, flags.
    ///
    /// A missing/invalid title gets one typo-correction attempt; if the
    /// search yields a different candidate it is re-resolved once, otherwise
    /// the result carries `is_missing = true`.
    pub async fn resolve(&self, raw_title: &str) -> Result<ResolvedIdentity, Error> {
        if let Some(identity) = self.resolve_once(raw_title).await? {
            return Ok(identity);
        }

        if let Some(candidate) = self.suggest(raw_title).await
            && candidate != raw_title
            && let Some(identity) = self.resolve_once(&candidate).await?
        {
            return Ok(identity);
        }

        Ok(ResolvedIdentity { title: raw_title.to_string(), is_missing: true, ..Default::default() })
    }

    async fn resolve_once(&self, raw_title: &str) -> Result<Option<ResolvedIdentity>, Error> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("redirects", "1"),
            ("titles", raw_title),
            ("prop", "info|revisions|pageprops"),
            ("rvprop", "ids|timestamp"),
            ("inprop", "url"),
        ];

        let value = self.request.request_json(&params).await?;
        let parsed: QueryResponse =
            serde_json::from_value(value).map_err(|e| Error::Parse(format!("unexpected query response: {e}")))?;
        identity_from_query(raw_title, &parsed)
    }

    /// Ask the search endpoint for a likely intended title.
    ///
    /// Best-effort: any failure degrades to `None`. These one-shot calls
    /// bypass the raw-response cache.
    pub async fn suggest(&self, title: &str) -> Option<String> {
        let params = [
            ("action", "opensearch"),
            ("format", "json"),
            ("search", title),
            ("limit", "1"),
            ("namespace", "0"),
        ];

        match self.request.request_json_uncached(&params).await {
            Ok(value) => value
                .get(1)
                .and_then(|titles| titles.get(0))
                .and_then(|t| t.as_str())
                .map(str::to_string),
            Err(e) => {
                tracing::debug!("suggestion lookup failed for {title}: {e}");
                None
            }
        }
    }

    /// Fetch the ordered section metadata list for a page.
    pub async fn sections(&self, title: &str) -> Result<Vec<SectionDescriptor>, Error> {
        let params = [("action", "parse"), ("format", "json"), ("prop", "sections"), ("page", title)];

        let value = self.request.request_json(&params).await?;
        let parsed: ParseResponse =
            serde_json::from_value(value).map_err(|e| Error::Parse(format!("unexpected sections response: {e}")))?;
        Ok(parsed.parse.map(|p| p.sections).unwrap_or_default())
    }

    /// Fetch the HTML body of one section by its index token.
    pub async fn section_html(&self, title: &str, index: &str) -> Result<SectionHtml, Error> {
        let params = [
            ("action", "parse"),
            ("format", "json"),
            ("prop", "text|revid"),
            ("page", title),
            ("section", index),
        ];

        let value = self.request.request_json(&params).await?;
        let parsed: ParseResponse =
            serde_json::from_value(value).map_err(|e| Error::Parse(format!("unexpected text response: {e}")))?;

        let body = parsed
            .parse
            .ok_or_else(|| Error::Parse("response missing parse body".into()))?;
        let html = body
            .text
            .and_then(|t| t.content)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Parse("empty parse HTML".into()))?;

        Ok(SectionHtml { html, revision: body.revid.map(|r| r.to_string()) })
    }
}

/// Fold a query response into a canonical identity.
///
/// Title precedence: normalization result, then redirect target, then the
/// page's own title, then the raw input. Returns `Ok(None)` when the remote
/// reports the page missing or the title invalid.
fn identity_from_query(raw_title: &str, parsed: &QueryResponse) -> Result<Option<ResolvedIdentity>, Error> {
    let body = parsed
        .query
        .as_ref()
        .ok_or_else(|| Error::Parse("response missing query body".into()))?;
    let page = body
        .pages
        .values()
        .next()
        .ok_or_else(|| Error::Parse("response missing pages".into()))?;

    if page.missing.is_some() || page.invalid.is_some() {
        return Ok(None);
    }

    let title = body
        .normalized
        .first()
        .map(|m| m.to.clone())
        .or_else(|| body.redirects.first().map(|m| m.to.clone()))
        .or_else(|| page.title.clone())
        .unwrap_or_else(|| raw_title.to_string());

    let first_revision = page.revisions.first();
    let last_revision = first_revision
        .and_then(|r| r.revid)
        .or(page.lastrevid)
        .map(|id| id.to_string());
    let last_updated_at = first_revision.and_then(|r| r.timestamp.clone());
    let is_disambiguation = page
        .pageprops
        .as_ref()
        .is_some_and(|props| props.disambiguation.is_some());

    Ok(Some(ResolvedIdentity {
        title,
        canonical_url: page.fullurl.clone(),
        last_revision,
        last_updated_at,
        is_disambiguation,
        is_missing: false,
    }))
}
