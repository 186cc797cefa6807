//! Section selection and content assembly.
//!
//! Selection is fail-open: a requested fragment that matches no section
//! falls back to fetching every section, preferring completeness over
//! precision. Assembly tolerates per-section failures, dropping the failed
//! section and recording the problem while siblings proceed.

use async_trait::async_trait;
use wikistack_core::{Error, SectionContent};

use crate::api::{SectionDescriptor, SectionHtml, WikiClient};
use crate::classify::{ClassifyConfig, is_reference_like};

/// Pick the sections to fetch for an optional fragment.
///
/// With a fragment: exact anchor match first, then a case-insensitive
/// heading match (underscores as spaces), else all sections. Without one,
/// an optional index allowlist filters the list.
pub fn select_sections(
    all: &[SectionDescriptor], fragment: Option<&str>, allowlist: Option<&[String]>,
) -> Vec<SectionDescriptor> {
    if let Some(fragment) = fragment {
        let fragment_lower = fragment.to_lowercase();
        let heading_target = fragment_lower.replace('_', " ");

        let by_anchor = all
            .iter()
            .find(|s| s.anchor.as_deref().is_some_and(|a| a.to_lowercase() == fragment_lower));
        let by_heading = all.iter().find(|s| s.heading.to_lowercase() == heading_target);

        if let Some(hit) = by_anchor.or(by_heading) {
            return vec![hit.clone()];
        }
        return all.to_vec();
    }

    if let Some(allowlist) = allowlist {
        return all
            .iter()
            .filter(|s| allowlist.iter().any(|index| index == &s.index))
            .cloned()
            .collect();
    }

    all.to_vec()
}

/// Source of section bodies; the API client in production, a stub in tests.
#[async_trait]
pub trait SectionFetcher: Sync {
    async fn section_html(&self, title: &str, index: &str) -> Result<SectionHtml, Error>;
}

#[async_trait]
impl SectionFetcher for WikiClient {
    async fn section_html(&self, title: &str, index: &str) -> Result<SectionHtml, Error> {
        WikiClient::section_html(self, title, index).await
    }
}

/// Assembled section bodies plus any per-section problems.
#[derive(Debug, Default)]
pub struct SectionAssembly {
    pub sections: Vec<SectionContent>,
    pub problems: Vec<String>,
}

/// Fetch and classify the body of each selected section.
///
/// A failing body fetch drops that section and appends a problem entry
/// naming its heading; the remaining sections still succeed.
pub async fn assemble_sections(
    fetcher: &dyn SectionFetcher, title: &str, picked: &[SectionDescriptor], classify: &ClassifyConfig,
) -> SectionAssembly {
    let mut assembly = SectionAssembly::default();

    for descriptor in picked {
        match fetcher.section_html(title, &descriptor.index).await {
            Ok(SectionHtml { html, .. }) => {
                let reference_like = is_reference_like(&descriptor.heading, &html, classify);
                assembly.sections.push(SectionContent {
                    index: descriptor.index.clone(),
                    heading: descriptor.heading.clone(),
                    anchor: descriptor.anchor.clone(),
                    level: descriptor.level,
                    html,
                    reference_like,
                });
            }
            Err(e) => {
                tracing::warn!("section \"{}\" failed on \"{title}\": {e}", descriptor.heading);
                assembly
                    .problems
                    .push(format!("Section \"{}\" failed on \"{title}\": {e}", descriptor.heading));
            }
        }
    }

    assembly
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(index: &str, heading: &str, anchor: &str) -> SectionDescriptor {
        SectionDescriptor {
            index: index.to_string(),
            heading: heading.to_string(),
            anchor: Some(anchor.to_string()),
            level: 1,
        }
    }

    fn sample_sections() -> Vec<SectionDescriptor> {
        vec![
            descriptor("1", "History", "History"),
            descriptor("2", "Early life", "Early_life"),
            descriptor("3", "See also", "See_also"),
        ]
    }

    #[test]
    fn test_select_by_anchor() {
        let all = sample_sections();
        let picked = select_sections(&all, Some("Early_life"), None);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].heading, "Early life");
    }

    #[test]
    fn test_select_by_anchor_case_insensitive() {
        let all = sample_sections();
        let picked = select_sections(&all, Some("early_LIFE"), None);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].index, "2");
    }

    #[test]
    fn test_select_by_heading_when_anchor_misses() {
        let all = sample_sections();
        // "Early life" has anchor "Early_life", so the space-separated form
        // only matches through the heading comparison.
        let picked = select_sections(&all, Some("Early life"), None);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].index, "2");
    }

    #[test]
    fn test_unmatched_fragment_falls_open_to_all() {
        let all = sample_sections();
        let picked = select_sections(&all, Some("Nonexistent"), None);
        assert_eq!(picked.len(), all.len());
    }

    #[test]
    fn test_allowlist_without_fragment() {
        let all = sample_sections();
        let allowlist = vec!["1".to_string(), "3".to_string()];
        let picked = select_sections(&all, None, Some(&allowlist));
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].index, "1");
        assert_eq!(picked[1].index, "3");
    }

    #[test]
    fn test_no_fragment_no_allowlist_selects_all() {
        let all = sample_sections();
        assert_eq!(select_sections(&all, None, None).len(), 3);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let all = sample_sections();
        let first = select_sections(&all, Some("History"), None);
        let second = select_sections(&all, Some("History"), None);
        assert_eq!(first, second);
    }

    struct StubFetcher {
        fail_index: &'static str,
    }

    #[async_trait]
    impl SectionFetcher for StubFetcher {
        async fn section_html(&self, _title: &str, index: &str) -> Result<SectionHtml, Error> {
            if index == self.fail_index {
                return Err(Error::Transport("HTTP 500".into()));
            }
            Ok(SectionHtml { html: format!("<p>section {index}</p>"), revision: Some("42".into()) })
        }
    }

    #[tokio::test]
    async fn test_partial_failure_drops_only_failed_section() {
        let picked = sample_sections();
        let fetcher = StubFetcher { fail_index: "2" };

        let assembly = assemble_sections(&fetcher, "Example", &picked, &ClassifyConfig::default()).await;

        assert_eq!(assembly.sections.len(), 2);
        assert_eq!(assembly.sections[0].index, "1");
        assert_eq!(assembly.sections[1].index, "3");
        assert_eq!(assembly.problems.len(), 1);
        assert!(assembly.problems[0].contains("Early life"));
        assert!(assembly.problems[0].contains("Example"));
    }

    #[tokio::test]
    async fn test_assembly_classifies_each_section() {
        let picked = sample_sections();
        let fetcher = StubFetcher { fail_index: "" };

        let assembly = assemble_sections(&fetcher, "Example", &picked, &ClassifyConfig::default()).await;

        assert_eq!(assembly.sections.len(), 3);
        assert!(!assembly.sections[0].reference_like);
        assert!(!assembly.sections[1].reference_like);
        // "See also" classifies by heading regardless of body content.
        assert!(assembly.sections[2].reference_like);
        assert!(assembly.problems.is_empty());
    }

    #[tokio::test]
    async fn test_assembly_is_idempotent() {
        let picked = sample_sections();
        let fetcher = StubFetcher { fail_index: "" };

        let first = assemble_sections(&fetcher, "Example", &picked, &ClassifyConfig::default()).await;
        let second = assemble_sections(&fetcher, "Example", &picked, &ClassifyConfig::default()).await;
        assert_eq!(first.sections, second.sections);
    }
}
