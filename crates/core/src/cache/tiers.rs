//! Three-tier record lookup: static snapshot files, the SQLite durable
//! store, and a last-resort in-memory map.
//!
//! The backend is chosen once at startup: if the durable store cannot be
//! opened the tier manager runs on the in-memory map for the rest of the
//! session. That degradation is logged and never surfaced to callers;
//! durability is best-effort.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::connection::CacheDb;
use super::records::CacheRecord;

/// Which tier satisfied a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierHit {
    StaticSnapshot,
    Durable,
}

/// A cached record is fresh only when both revision markers are present and
/// equal. A missing marker on either side means freshness is unknown, which
/// always refetches.
pub fn revision_fresh(cached: Option<&str>, current: Option<&str>) -> bool {
    matches!((cached, current), (Some(a), Some(b)) if a == b)
}

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, (CacheRecord, DateTime<Utc>)>>,
    raw: Mutex<HashMap<String, (DateTime<Utc>, String)>>,
}

enum Backend {
    Durable(CacheDb),
    Memory(MemoryStore),
}

/// Tiered cache handle, constructed once per process and threaded through
/// the pipeline explicitly.
pub struct CacheTiers {
    static_dir: Option<PathBuf>,
    backend: Backend,
}

impl CacheTiers {
    /// Open the durable store at `db_path`, degrading to the in-memory
    /// backend if that fails. Never errors.
    pub async fn open(db_path: &Path, static_dir: Option<PathBuf>) -> Self {
        let backend = match CacheDb::open(db_path).await {
            Ok(db) => Backend::Durable(db),
            Err(e) => {
                tracing::warn!(
                    "durable store unavailable at {}: {e}; falling back to in-memory cache",
                    db_path.display()
                );
                Backend::Memory(MemoryStore::default())
            }
        };
        Self { static_dir, backend }
    }

    /// A tier manager with no durable backing. Used by tests and as the
    /// degraded mode.
    pub fn in_memory(static_dir: Option<PathBuf>) -> Self {
        Self { static_dir, backend: Backend::Memory(MemoryStore::default()) }
    }

    /// Wrap an already-open durable store.
    pub fn with_db(db: CacheDb, static_dir: Option<PathBuf>) -> Self {
        Self { static_dir, backend: Backend::Durable(db) }
    }

    /// Backend label for operator-facing logs.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Durable(_) => "sqlite",
            Backend::Memory(_) => "memory",
        }
    }

    /// Tiered read, first fresh hit wins: static snapshot file, then the
    /// durable store. A static hit is mirrored into the durable store so
    /// subsequent lookups skip the file.
    pub async fn lookup(
        &self, key: &str, slug: &str, current_revision: Option<&str>,
    ) -> Option<(CacheRecord, TierHit)> {
        if let Some(record) = self.read_snapshot(slug).await
            && revision_fresh(record.last_revision.as_deref(), current_revision)
        {
            self.put(&record).await;
            return Some((record, TierHit::StaticSnapshot));
        }

        if let Some(record) = self.get(key).await
            && revision_fresh(record.last_revision.as_deref(), current_revision)
        {
            return Some((record, TierHit::Durable));
        }

        None
    }

    /// Read a record by key from the backing store, with no freshness check.
    pub async fn get(&self, key: &str) -> Option<CacheRecord> {
        match &self.backend {
            Backend::Durable(db) => match db.get_record(key).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("durable read failed for {key}: {e}");
                    None
                }
            },
            Backend::Memory(mem) => mem.records.lock().await.get(key).map(|(r, _)| r.clone()),
        }
    }

    /// Write a record, fully overwriting any previous value under the same
    /// key and stamping its touched-at timestamp. Store failures are logged
    /// and swallowed.
    pub async fn put(&self, record: &CacheRecord) {
        match &self.backend {
            Backend::Durable(db) => {
                if let Err(e) = db.upsert_record(record).await {
                    tracing::warn!("durable write failed for {}: {e}", record.key);
                }
            }
            Backend::Memory(mem) => {
                mem.records
                    .lock()
                    .await
                    .insert(record.key.clone(), (record.clone(), Utc::now()));
            }
        }
    }

    /// Delete oldest-touched records beyond `max_entries`.
    ///
    /// Returns the number of removed records.
    pub async fn prune(&self, max_entries: usize) -> usize {
        match &self.backend {
            Backend::Durable(db) => match db.prune_records(max_entries).await {
                Ok(removed) => removed as usize,
                Err(e) => {
                    tracing::warn!("prune failed: {e}");
                    0
                }
            },
            Backend::Memory(mem) => {
                let mut records = mem.records.lock().await;
                if records.len() <= max_entries {
                    return 0;
                }
                let mut by_age: Vec<(String, DateTime<Utc>)> =
                    records.iter().map(|(k, (_, t))| (k.clone(), *t)).collect();
                by_age.sort_by_key(|(_, t)| *t);
                let excess = by_age.len() - max_entries;
                for (key, _) in by_age.into_iter().take(excess) {
                    records.remove(&key);
                }
                excess
            }
        }
    }

    /// Read-through lookup for a raw API response within the TTL.
    pub async fn raw_get(&self, params_key: &str, max_age_secs: i64) -> Option<String> {
        match &self.backend {
            Backend::Durable(db) => match db.get_raw(params_key, max_age_secs).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("raw cache read failed: {e}");
                    None
                }
            },
            Backend::Memory(mem) => {
                let raw = mem.raw.lock().await;
                let (fetched_at, payload) = raw.get(params_key)?;
                if Utc::now() - *fetched_at > Duration::seconds(max_age_secs) {
                    return None;
                }
                Some(payload.clone())
            }
        }
    }

    /// Store a raw API response payload.
    pub async fn raw_put(&self, params_key: &str, payload: &str) {
        match &self.backend {
            Backend::Durable(db) => {
                if let Err(e) = db.put_raw(params_key, payload).await {
                    tracing::warn!("raw cache write failed: {e}");
                }
            }
            Backend::Memory(mem) => {
                mem.raw
                    .lock()
                    .await
                    .insert(params_key.to_string(), (Utc::now(), payload.to_string()));
            }
        }
    }

    /// Drop raw responses older than `max_age_secs`.
    ///
    /// Returns the number of removed entries.
    pub async fn purge_expired_raw(&self, max_age_secs: i64) -> usize {
        match &self.backend {
            Backend::Durable(db) => match db.purge_expired_raw(max_age_secs).await {
                Ok(removed) => removed as usize,
                Err(e) => {
                    tracing::warn!("raw cache purge failed: {e}");
                    0
                }
            },
            Backend::Memory(mem) => {
                let mut raw = mem.raw.lock().await;
                let cutoff = Utc::now() - Duration::seconds(max_age_secs);
                let before = raw.len();
                raw.retain(|_, (fetched_at, _)| *fetched_at > cutoff);
                before - raw.len()
            }
        }
    }

    async fn read_snapshot(&self, slug: &str) -> Option<CacheRecord> {
        let dir = self.static_dir.as_ref()?;
        let path = dir.join(format!("{slug}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("unreadable snapshot {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::records::SectionContent;

    fn make_record(key: &str, revision: Option<&str>) -> CacheRecord {
        CacheRecord {
            key: key.to_string(),
            title: "Example".to_string(),
            url: None,
            updated_at: None,
            last_revision: revision.map(str::to_string),
            sections: vec![SectionContent {
                index: "1".to_string(),
                heading: "History".to_string(),
                anchor: Some("History".to_string()),
                level: 1,
                html: "<p>body</p>".to_string(),
                reference_like: false,
            }],
        }
    }

    #[test]
    fn test_revision_freshness() {
        assert!(revision_fresh(Some("42"), Some("42")));
        assert!(!revision_fresh(Some("42"), Some("43")));
        assert!(!revision_fresh(None, Some("42")));
        assert!(!revision_fresh(Some("42"), None));
        // Unknown on both sides is stale, never served.
        assert!(!revision_fresh(None, None));
    }

    #[tokio::test]
    async fn test_durable_hit_requires_matching_revision() {
        let tiers = CacheTiers::with_db(CacheDb::open_in_memory().await.unwrap(), None);
        tiers.put(&make_record("Example#ALL", Some("42"))).await;

        assert!(tiers.lookup("Example#ALL", "example-all", Some("42")).await.is_some());
        assert!(tiers.lookup("Example#ALL", "example-all", Some("43")).await.is_none());
        assert!(tiers.lookup("Example#ALL", "example-all", None).await.is_none());
    }

    #[tokio::test]
    async fn test_static_tier_wins_and_mirrors() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = make_record("Example#ALL", Some("42"));
        let path = dir.path().join("example-all.json");
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let tiers = CacheTiers::with_db(
            CacheDb::open_in_memory().await.unwrap(),
            Some(dir.path().to_path_buf()),
        );

        let (record, tier) = tiers.lookup("Example#ALL", "example-all", Some("42")).await.unwrap();
        assert_eq!(tier, TierHit::StaticSnapshot);
        assert_eq!(record, snapshot);

        // Mirrored into the durable store: still found after the file goes away.
        std::fs::remove_file(&path).unwrap();
        let (_, tier) = tiers.lookup("Example#ALL", "example-all", Some("42")).await.unwrap();
        assert_eq!(tier, TierHit::Durable);
    }

    #[tokio::test]
    async fn test_stale_static_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = make_record("Example#ALL", Some("41"));
        std::fs::write(
            dir.path().join("example-all.json"),
            serde_json::to_string(&snapshot).unwrap(),
        )
        .unwrap();

        let tiers = CacheTiers::in_memory(Some(dir.path().to_path_buf()));
        assert!(tiers.lookup("Example#ALL", "example-all", Some("42")).await.is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_round_trip() {
        let tiers = CacheTiers::in_memory(None);
        assert_eq!(tiers.backend_name(), "memory");

        tiers.put(&make_record("Example#ALL", Some("42"))).await;
        let (record, tier) = tiers.lookup("Example#ALL", "example-all", Some("42")).await.unwrap();
        assert_eq!(tier, TierHit::Durable);
        assert_eq!(record.key, "Example#ALL");
    }

    #[tokio::test]
    async fn test_memory_prune_drops_oldest() {
        let tiers = CacheTiers::in_memory(None);
        for i in 0..10 {
            tiers.put(&make_record(&format!("Page{i}#ALL"), Some("1"))).await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(tiers.prune(5).await, 5);
        for i in 0..5 {
            assert!(tiers.get(&format!("Page{i}#ALL")).await.is_none());
        }
        for i in 5..10 {
            assert!(tiers.get(&format!("Page{i}#ALL")).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_memory_raw_ttl() {
        let tiers = CacheTiers::in_memory(None);
        tiers.raw_put("k", "{}").await;
        assert!(tiers.raw_get("k", 3600).await.is_some());
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(tiers.raw_get("k", 1).await.is_none());
        assert_eq!(tiers.purge_expired_raw(1).await, 1);
    }
}
