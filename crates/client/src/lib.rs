//! Offline caching interceptor for Monastery360.
//!
//! Requests from controlled pages are classified, routed to a caching
//! strategy, and answered from the partition store, the network, or a
//! synthesized offline response.

pub mod classify;
pub mod config;
pub mod fetch;
pub mod offline;
pub mod strategy;
pub mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{ClassifyRules, ResourceKind, classify};
pub use config::WorkerConfig;
pub use fetch::{FetchClient, FetchConfig, Network, NetworkError};
pub use strategy::{CachingStrategy, ResponseSource, Served, apply, strategy};
pub use worker::registration::RegisterReport;
pub use worker::{ActivateReport, FetchOutcome, InstallReport, OfflineWorker, Registration, WorkerState};
