//! Client side of wikistack: the resilient fetch layer, the MediaWiki API
//! client, section selection/classification, source discovery, and the
//! sequential processing pipeline.

pub mod api;
pub mod classify;
pub mod discover;
pub mod fetch;
pub mod pipeline;
pub mod sections;
pub mod util;

pub use api::{ResolvedIdentity, SectionDescriptor, SectionHtml, WikiClient};
pub use classify::{ClassifyConfig, is_reference_like};
pub use discover::collect_sources;
pub use fetch::{FetchConfig, RequestClient};
pub use pipeline::{Loader, Renderer, missing_stub};
pub use sections::{SectionAssembly, assemble_sections, select_sections};
