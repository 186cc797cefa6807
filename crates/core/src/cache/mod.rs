//! Layered cache for renderer-ready page records.
//!
//! Three lookup tiers, consulted in order with first fresh hit winning:
//!
//! 1. Precomputed static snapshot files (seeded by the prefetch tool)
//! 2. SQLite durable store with async access via tokio-rusqlite
//! 3. Live fetch (the caller's responsibility on a miss)
//!
//! Freshness is revision-marker equality, never content inspection. The
//! durable store also holds the TTL-bounded raw API response cache and is
//! pruned to a size budget by write recency.

pub mod connection;
pub mod keys;
pub mod migrations;
pub mod raw;
pub mod records;
pub mod tiers;

pub use crate::Error;

pub use connection::CacheDb;
pub use records::{CacheRecord, SectionContent};
pub use tiers::{CacheTiers, TierHit, revision_fresh};
