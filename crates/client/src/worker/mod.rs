//! The offline worker: one version of the interceptor and its lifecycle.
//!
//! A worker is an explicit object holding its configuration, the partition
//! store, and the network; install, activate, fetch, and sync are methods on
//! it rather than callbacks on a global. [`Registration`] decides which
//! version is active.

mod install;
pub mod registration;
pub mod state;

use std::sync::Arc;

use m360_core::{CacheStorage, Error, Request};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub use install::InstallReport;
pub use registration::Registration;
pub use state::WorkerState;

use crate::classify::{ResourceKind, classify};
use crate::config::WorkerConfig;
use crate::fetch::Network;
use crate::strategy::{Served, apply, strategy};

/// What the worker did with a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller goes to the network itself.
    PassThrough,
    Respond { kind: ResourceKind, served: Served },
}

impl FetchOutcome {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, FetchOutcome::PassThrough)
    }

    pub fn served(&self) -> Option<&Served> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Respond { served, .. } => Some(served),
        }
    }
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    pub version: String,
    /// Stale partitions removed, in creation order.
    pub deleted: Vec<String>,
}

pub struct OfflineWorker {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { config, storage, network, state: RwLock::new(WorkerState::Unregistered) }
    }

    pub fn version(&self) -> &str {
        self.config.version()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, next: WorkerState) {
        *self.state.write().await = next;
    }

    /// Move to `next` if the current state is one of `from`.
    async fn transition(&self, from: &[WorkerState], next: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !from.contains(&*state) {
            return Err(Error::InvalidState(format!(
                "{} cannot become {next} from {}",
                self.version(),
                *state
            )));
        }
        *state = next;
        Ok(())
    }

    /// Precache the manifest into the primary partition.
    ///
    /// Under the atomic policy any failed asset fails the install, nothing is
    /// stored, and this version becomes redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[WorkerState::Unregistered], WorkerState::Installing).await?;
        tracing::info!(version = self.version(), assets = self.config.manifest.len(), "installing");

        match install::precache(&self.config, self.storage.as_ref(), &self.network).await {
            Ok(report) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(version = self.version(), cached = report.cached, "installed");
                Ok(report)
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(version = self.version(), error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Drop every partition this version does not know, then take control.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.transition(&[WorkerState::Installed], WorkerState::Activating).await?;

        match self.clean_partitions().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Active).await;
                tracing::info!(version = self.version(), deleted = deleted.len(), "activated, clients claimed");
                Ok(ActivateReport { version: self.version().to_string(), deleted })
            }
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                tracing::warn!(version = self.version(), error = %e, "activation failed");
                Err(e)
            }
        }
    }

    async fn clean_partitions(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if self.config.names.contains(&name) {
                continue;
            }
            self.storage.delete(&name).await?;
            tracing::info!(partition = %name, "deleted stale partition");
            deleted.push(name);
        }

        for name in self.config.names.all() {
            self.storage.open(name).await?;
        }

        Ok(deleted)
    }

    /// Answer or decline one request from a controlled page.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state().await.can_intercept_fetch() {
            return FetchOutcome::PassThrough;
        }

        let Some(kind) = classify(request, &self.config.rules) else {
            tracing::debug!(method = %request.method, url = %request.url, "pass-through");
            return FetchOutcome::PassThrough;
        };

        let strategy = strategy(kind, &self.config);
        tracing::debug!(?kind, partition = strategy.partition(), url = %request.url, "intercepting");

        let served = apply(&strategy, request, self.storage.as_ref(), self.network.as_ref()).await;
        FetchOutcome::Respond { kind, served }
    }

    /// Handle a background-sync event. Returns false for tags this worker
    /// does not own.
    pub async fn sync(&self, tag: &str) -> Result<bool, Error> {
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "ignoring sync tag");
            return Ok(false);
        }
        self.replay_queued().await?;
        Ok(true)
    }

    async fn replay_queued(&self) -> Result<(), Error> {
        // TODO: replay bookings queued while offline once the booking flow records them.
        Ok(())
    }

    pub(crate) async fn retire(&self) {
        self.set_state(WorkerState::Redundant).await;
        tracing::info!(version = self.version(), "retired");
    }
}
