//! Snapshot-writing renderer for the prefetch tool.

use std::path::PathBuf;

use async_trait::async_trait;
use wikistack_client::Renderer;
use wikistack_core::cache::keys::cache_slug;
use wikistack_core::{CacheRecord, Error};

/// Writes each rendered record to `{out_dir}/{slug}.json`, skipping files
/// whose content is already up to date so deployment diffs stay minimal.
pub struct SnapshotWriter {
    out_dir: PathBuf,
    pub written: usize,
    pub unchanged: usize,
}

impl SnapshotWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir, written: 0, unchanged: 0 }
    }
}

#[async_trait]
impl Renderer for SnapshotWriter {
    async fn render(&mut self, record: &CacheRecord) -> Result<(), Error> {
        let fragment = record
            .key
            .rsplit_once('#')
            .map(|(_, frag)| frag)
            .filter(|frag| *frag != "ALL");
        let slug = cache_slug(&record.title, fragment);
        let path = self.out_dir.join(format!("{slug}.json"));

        let serialized = serde_json::to_string(record).map_err(|e| Error::Parse(e.to_string()))?;

        if let Ok(existing) = tokio::fs::read_to_string(&path).await
            && existing == serialized
        {
            tracing::info!("unchanged: {}", path.display());
            self.unchanged += 1;
            return Ok(());
        }

        tokio::fs::write(&path, &serialized)
            .await
            .map_err(|e| Error::Snapshot(format!("{}: {e}", path.display())))?;
        tracing::info!("cached: {}", path.display());
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikistack_core::SectionContent;

    fn make_record(key: &str) -> CacheRecord {
        CacheRecord {
            key: key.to_string(),
            title: key.split('#').next().unwrap_or(key).to_string(),
            url: None,
            updated_at: None,
            last_revision: Some("42".to_string()),
            sections: vec![SectionContent {
                index: "1".to_string(),
                heading: "History".to_string(),
                anchor: None,
                level: 1,
                html: "<p>body</p>".to_string(),
                reference_like: false,
            }],
        }
    }

    #[tokio::test]
    async fn test_writes_then_skips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SnapshotWriter::new(dir.path().to_path_buf());
        let record = make_record("Example#ALL");

        writer.render(&record).await.unwrap();
        assert_eq!(writer.written, 1);
        assert_eq!(writer.unchanged, 0);
        assert!(dir.path().join("example-all.json").exists());

        writer.render(&record).await.unwrap();
        assert_eq!(writer.written, 1);
        assert_eq!(writer.unchanged, 1);
    }

    #[tokio::test]
    async fn test_rewrites_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SnapshotWriter::new(dir.path().to_path_buf());

        writer.render(&make_record("Example#ALL")).await.unwrap();

        let mut changed = make_record("Example#ALL");
        changed.last_revision = Some("43".to_string());
        writer.render(&changed).await.unwrap();

        assert_eq!(writer.written, 2);
        let on_disk = std::fs::read_to_string(dir.path().join("example-all.json")).unwrap();
        let parsed: CacheRecord = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(parsed.last_revision.as_deref(), Some("43"));
    }

    #[tokio::test]
    async fn test_fragment_scoped_slug() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SnapshotWriter::new(dir.path().to_path_buf());
        writer.render(&make_record("Example#History")).await.unwrap();
        assert!(dir.path().join("example-history.json").exists());
    }
}
