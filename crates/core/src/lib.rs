//! Core types and shared functionality for wikistack.
//!
//! This crate provides:
//! - The three-tier cache (static snapshots, SQLite durable store, memory fallback)
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheRecord, CacheTiers, SectionContent};
pub use config::AppConfig;
pub use error::Error;
