//! Cache record storage.
//!
//! A record is the renderer-ready representation of one (title, fragment)
//! retrieval: the resolved page identity plus the assembled section bodies.
//! Records are written whole and superseded whole; there is no partial
//! update path.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One content subsection with its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    /// Opaque position token from the remote parser (not necessarily numeric).
    pub index: String,
    pub heading: String,
    pub anchor: Option<String>,
    pub level: u32,
    pub html: String,
    /// Citation/bibliography-style material, eligible for default-collapsed
    /// presentation by the renderer.
    pub reference_like: bool,
}

/// The persisted unit of storage for one (title, fragment-scope) retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// `"{title}#{fragment}"`, or `"{title}#ALL"` for whole-page scope.
    pub key: String,
    pub title: String,
    pub url: Option<String>,
    /// RFC3339 timestamp of the revision the sections were fetched from.
    pub updated_at: Option<String>,
    /// Opaque revision marker; equality against a freshly resolved identity
    /// is the sole freshness criterion.
    pub last_revision: Option<String>,
    pub sections: Vec<SectionContent>,
}

impl CacheDb {
    /// Insert or fully overwrite a cache record.
    ///
    /// Stamps the record's touched-at timestamp; reads never refresh it, so
    /// eviction is bounded by write recency.
    pub async fn upsert_record(&self, record: &CacheRecord) -> Result<(), Error> {
        let record = record.clone();
        let sections_json =
            serde_json::to_string(&record.sections).map_err(|e| Error::Parse(e.to_string()))?;
        let touched_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (
                        key, title, url, updated_at, last_revision, sections_json, touched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(key) DO UPDATE SET
                        title = excluded.title,
                        url = excluded.url,
                        updated_at = excluded.updated_at,
                        last_revision = excluded.last_revision,
                        sections_json = excluded.sections_json,
                        touched_at = excluded.touched_at",
                    params![
                        &record.key,
                        &record.title,
                        &record.url,
                        &record.updated_at,
                        &record.last_revision,
                        &sections_json,
                        &touched_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by key.
    ///
    /// Returns None if the key doesn't exist in the store.
    pub async fn get_record(&self, key: &str) -> Result<Option<CacheRecord>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, title, url, updated_at, last_revision, sections_json
                     FROM records WHERE key = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                });

                match result {
                    Ok((key, title, url, updated_at, last_revision, sections_json)) => {
                        let sections = serde_json::from_str(&sections_json)
                            .map_err(|e| Error::Parse(e.to_string()))?;
                        Ok(Some(CacheRecord { key, title, url, updated_at, last_revision, sections }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Count stored records.
    pub async fn count_records(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete oldest-touched records until the count is at or below
    /// `max_entries`.
    ///
    /// Returns the number of deleted entries.
    pub async fn prune_records(&self, max_entries: usize) -> Result<u64, Error> {
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM records WHERE key IN (
                        SELECT key FROM records ORDER BY touched_at ASC LIMIT ?1
                    )",
                    params![to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
