//! Sequential source processing: resolve, consult the cache tiers, fetch
//! and assemble on a miss, commit, hand off to the renderer.
//!
//! Sources are processed one at a time in input order; a failure on one
//! source never stops the run. The only caller-visible trace of trouble is
//! the ordered problem log plus stubbed or missing content.

use std::sync::Arc;

use async_trait::async_trait;
use wikistack_core::cache::keys::{cache_key, cache_slug};
use wikistack_core::{CacheRecord, CacheTiers, Error, SectionContent};

use crate::api::{ResolvedIdentity, WikiClient};
use crate::classify::ClassifyConfig;
use crate::sections::{assemble_sections, select_sections};
use crate::util::{display_title, extract_fragment, url_to_title};

/// Rendering collaborator. Receives each assembled record exactly once;
/// DOM concerns, link rewriting, and collapsed presentation live behind
/// this boundary.
#[async_trait]
pub trait Renderer: Send {
    async fn render(&mut self, record: &CacheRecord) -> Result<(), Error>;
}

/// The retrieval pipeline: API client, cache tiers, and the problem log
/// accumulated across one run.
pub struct Loader {
    wiki: WikiClient,
    tiers: Arc<CacheTiers>,
    classify: ClassifyConfig,
    section_allowlist: Option<Vec<String>>,
    problems: Vec<String>,
}

impl Loader {
    pub fn new(
        wiki: WikiClient, tiers: Arc<CacheTiers>, classify: ClassifyConfig,
        section_allowlist: Option<Vec<String>>,
    ) -> Self {
        Self { wiki, tiers, classify, section_allowlist, problems: Vec::new() }
    }

    /// Ordered, human-readable problems from the run so far.
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Process every source in input order. Per-source failures are logged
    /// and recorded; the run always completes.
    pub async fn run(&mut self, urls: &[String], renderer: &mut dyn Renderer) {
        for url in urls {
            if let Err(e) = self.process_source(url, renderer).await {
                tracing::warn!("skipping {url}: {e}");
                self.problems.push(format!("Failed URL: {url}: {e}"));
            }
        }
    }

    /// Run one source through resolve, cache check, and (when needed) a
    /// live fetch-and-assemble cycle.
    pub async fn process_source(&mut self, url: &str, renderer: &mut dyn Renderer) -> Result<(), Error> {
        let raw_title = url_to_title(url);
        if raw_title.is_empty() {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        let fragment = extract_fragment(url);

        let identity = self.wiki.resolve(&raw_title).await?;

        if identity.is_missing {
            self.problems
                .push(format!("Page not found: \"{}\"", display_title(&raw_title)));
            // A stub has no revision to be fresh against, so it is rendered
            // but never committed.
            let stub = missing_stub(&raw_title, fragment.as_deref());
            renderer.render(&stub).await?;
            return Ok(());
        }

        let key = cache_key(&identity.title, fragment.as_deref());
        let slug = cache_slug(&identity.title, fragment.as_deref());

        if let Some((record, tier)) = self
            .tiers
            .lookup(&key, &slug, identity.last_revision.as_deref())
            .await
        {
            tracing::debug!("cache hit for {key} via {tier:?}");
            renderer.render(&record).await?;
            return Ok(());
        }

        let record = self.fetch_and_assemble(&identity, fragment.as_deref(), key).await?;
        self.tiers.put(&record).await;
        renderer.render(&record).await?;
        Ok(())
    }

    async fn fetch_and_assemble(
        &mut self, identity: &ResolvedIdentity, fragment: Option<&str>, key: String,
    ) -> Result<CacheRecord, Error> {
        let all = self.wiki.sections(&identity.title).await?;
        let picked = select_sections(&all, fragment, self.section_allowlist.as_deref());

        let assembly = assemble_sections(&self.wiki, &identity.title, &picked, &self.classify).await;
        self.problems.extend(assembly.problems);

        Ok(CacheRecord {
            key,
            title: identity.title.clone(),
            url: identity.canonical_url.clone(),
            updated_at: identity.last_updated_at.clone(),
            last_revision: identity.last_revision.clone(),
            sections: assembly.sections,
        })
    }

    /// Prune the durable store to the given cap.
    pub async fn prune(&self, max_entries: usize) -> usize {
        self.tiers.prune(max_entries).await
    }
}

/// Stub record for a page the resolver could not find: a single synthetic
/// section so the renderer and the rest of the run proceed uninterrupted.
pub fn missing_stub(raw_title: &str, fragment: Option<&str>) -> CacheRecord {
    CacheRecord {
        key: cache_key(raw_title, fragment),
        title: raw_title.to_string(),
        url: None,
        updated_at: None,
        last_revision: None,
        sections: vec![SectionContent {
            index: "0".to_string(),
            heading: "Not found".to_string(),
            anchor: None,
            level: 1,
            html: r#"<div class="error">Page missing</div>"#.to_string(),
            reference_like: false,
        }],
    }
}
