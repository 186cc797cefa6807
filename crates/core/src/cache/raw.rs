//! Raw API response cache.
//!
//! One entry per distinct outbound request, keyed by the serialized request
//! parameters. TTL-bounded: a read within the TTL short-circuits the network
//! call entirely; entries are written only after a fully successful response.

use super::connection::CacheDb;
use crate::Error;
use chrono::{Duration, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get a cached raw response payload, honoring the TTL.
    ///
    /// Returns None when the key is absent or the entry is older than
    /// `max_age_secs`.
    pub async fn get_raw(&self, params_key: &str, max_age_secs: i64) -> Result<Option<String>, Error> {
        let params_key = params_key.to_string();
        let cutoff = (Utc::now() - Duration::seconds(max_age_secs)).to_rfc3339();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT payload FROM raw_responses WHERE params_key = ?1 AND fetched_at > ?2",
                )?;

                let result = stmt.query_row(params![params_key, cutoff], |row| row.get(0));

                match result {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite a raw response payload, stamping the fetch time.
    pub async fn put_raw(&self, params_key: &str, payload: &str) -> Result<(), Error> {
        let params_key = params_key.to_string();
        let payload = payload.to_string();
        let fetched_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO raw_responses (params_key, fetched_at, payload)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(params_key) DO UPDATE SET
                        fetched_at = excluded.fetched_at,
                        payload = excluded.payload",
                    params![params_key, fetched_at, payload],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete raw responses older than `max_age_secs`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_raw(&self, max_age_secs: i64) -> Result<u64, Error> {
        let cutoff = (Utc::now() - Duration::seconds(max_age_secs)).to_rfc3339();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM raw_responses WHERE fetched_at <= ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
