//! Core types and shared functionality for the Monastery360 offline worker.
//!
//! This crate provides:
//! - Request/response exchange types
//! - Partition store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;

pub use cache::{CacheDb, CacheStorage, StoredEntry};
pub use config::{AppConfig, CacheNames, ConfigError, InstallPolicy};
pub use error::Error;
pub use exchange::{Destination, Request, RequestMode, Response};
