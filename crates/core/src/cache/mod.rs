//! SQLite-backed partition store.
//!
//! Persists the interceptor's named cache partitions with async access via
//! tokio-rusqlite:
//!
//! - Request-identity keys (SHA-256 of method and URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-partition deletion as the only eviction path

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use partitions::StoredEntry;
pub use storage::CacheStorage;
