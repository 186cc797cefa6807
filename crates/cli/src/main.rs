//! wikistack-prefetch: walk a source directory tree, run the retrieval
//! pipeline, and write static snapshot files for first-load cache seeding.
//!
//! Logging goes to stderr; set RUST_LOG to adjust verbosity.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikistack_client::{ClassifyConfig, FetchConfig, Loader, RequestClient, WikiClient, collect_sources};
use wikistack_core::{AppConfig, CacheTiers};

mod snapshot;

use snapshot::SnapshotWriter;

/// Prefetch wiki sources into static snapshot files.
///
/// Reads configuration from WIKISTACK_* environment variables and an
/// optional TOML file named by WIKISTACK_CONFIG_FILE.
#[derive(Parser)]
#[command(name = "wikistack-prefetch")]
struct Cli {
    /// Directory to scan for urls.json / manifest.json trees
    #[arg(default_value = ".")]
    start_dir: PathBuf,

    /// Output directory for snapshot files (default: <start_dir>/cache)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Override the configured durable-store entry cap
    #[arg(long)]
    max_entries: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let sources = collect_sources(&cli.start_dir).await;
    if sources.is_empty() {
        tracing::warn!(
            "no sources found under {}; add a urls.json or a manifest.json with \"children\"",
            cli.start_dir.display()
        );
        return Ok(());
    }
    tracing::info!("collected {} source(s) from {}", sources.len(), cli.start_dir.display());

    // The prefetch run generates the static tier, so lookups skip it.
    let tiers = Arc::new(CacheTiers::open(&config.db_path, None).await);
    tracing::info!("cache backend: {}", tiers.backend_name());

    let request = RequestClient::new(FetchConfig::from(&config), tiers.clone())?;
    let wiki = WikiClient::new(request);
    let mut loader = Loader::new(
        wiki,
        tiers.clone(),
        ClassifyConfig::from(&config),
        config.section_allowlist.clone(),
    );

    let out_dir = cli.out_dir.unwrap_or_else(|| cli.start_dir.join("cache"));
    tokio::fs::create_dir_all(&out_dir).await?;
    let mut writer = SnapshotWriter::new(out_dir);

    loader.run(&sources, &mut writer).await;

    tracing::info!("snapshots: {} written, {} unchanged", writer.written, writer.unchanged);

    for problem in loader.problems() {
        tracing::warn!("{problem}");
    }

    let max_entries = cli.max_entries.unwrap_or(config.max_cache_entries);
    let removed = loader.prune(max_entries).await;
    if removed > 0 {
        tracing::info!("pruned {removed} cache record(s) beyond the {max_entries}-entry cap");
    }

    let expired = tiers.purge_expired_raw(config.raw_ttl_secs).await;
    if expired > 0 {
        tracing::info!("purged {expired} expired raw response(s)");
    }

    Ok(())
}
