//! Reference-like section classification.
//!
//! Decides whether a section is citation/bibliography-style material, by
//! heading text or by structural signals in the HTML body. Pure and
//! deterministic for the same input; the renderer uses the resulting flag
//! for default-collapsed presentation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use wikistack_core::AppConfig;

use crate::util::normalize_heading;

/// Classification knobs.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Classify by canonical heading names.
    pub by_heading: bool,
    /// Classify by the structural heuristic on the body.
    pub by_structure: bool,
    /// Footnote-style markers needed before the structural heuristic fires.
    pub marker_threshold: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { by_heading: true, by_structure: true, marker_threshold: 4 }
    }
}

impl From<&AppConfig> for ClassifyConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            by_heading: config.collapse_by_heading,
            by_structure: config.collapse_by_heuristic,
            marker_threshold: config.ref_marker_threshold,
        }
    }
}

static CANONICAL_HEADINGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "references",
        "reference",
        "citations",
        "citation",
        "notes",
        "footnotes",
        "footnote",
        "bibliography",
        "external links",
        "further reading",
        "see also",
        "sources",
        "works cited",
        "literature",
    ])
});

static CONJOINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(notes?|references?|citations?|footnotes?)\s+(and|&)\s+(notes?|references?|citations?|footnotes?)")
        .unwrap()
});

static COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(references?|bibliography|works cited|sources).*(further reading|external links|see also)").unwrap()
});

// "Notes/References"-style headings arrive here with the slash already
// normalized to a space.
static PAIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(notes?|references?)\s+(notes?|references?)$").unwrap());

/// True when a heading names reference/citation material, alone or as a
/// short conjunction.
pub fn is_reference_like_heading(heading: &str) -> bool {
    let normalized = normalize_heading(heading);
    if normalized.is_empty() {
        return false;
    }
    CANONICAL_HEADINGS.contains(normalized.as_str())
        || CONJOINED.is_match(&normalized)
        || COMBINED.is_match(&normalized)
        || PAIRED.is_match(&normalized)
}

static NUMERIC_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\[\d+\]|\d{1,3}|\^|†)$").unwrap());

/// True when the HTML body carries a references-list container or at least
/// `marker_threshold` footnote-style markers.
pub fn is_reference_like_html(html: &str, marker_threshold: usize) -> bool {
    let doc = Html::parse_fragment(html);
    has_reference_container(&doc) || count_reference_markers(&doc) >= marker_threshold
}

/// Combined classification: heading check, then the structural heuristic,
/// each gated by its config toggle.
pub fn is_reference_like(heading: &str, html: &str, config: &ClassifyConfig) -> bool {
    (config.by_heading && is_reference_like_heading(heading))
        || (config.by_structure && is_reference_like_html(html, config.marker_threshold))
}

fn has_reference_container(doc: &Html) -> bool {
    let selector = Selector::parse("ol.references, .reflist, .mw-references-wrap").expect("invalid selector");
    doc.select(&selector).next().is_some()
}

fn count_reference_markers(doc: &Html) -> usize {
    let sup_selector = Selector::parse("sup").expect("invalid selector");
    let cite_selector = Selector::parse(r##"a[href^="#cite_"]"##).expect("invalid selector");

    let mut markers = 0;

    for sup in doc.select(&sup_selector) {
        let reference_class = sup.value().classes().any(|c| c == "reference");
        let has_cite_link = sup.select(&cite_selector).next().is_some();
        let text: String = sup.text().collect();
        if reference_class || has_cite_link || NUMERIC_MARKER.is_match(text.trim()) {
            markers += 1;
        }
    }

    // Citation anchors sitting outside any superscript (backlinks etc.).
    for link in doc.select(&cite_selector) {
        let inside_sup = link
            .ancestors()
            .any(|node| node.value().as_element().is_some_and(|e| e.name() == "sup"));
        if !inside_sup {
            markers += 1;
        }
    }

    markers
}
