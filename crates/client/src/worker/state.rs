use serde::{Deserialize, Serialize};

/// Lifecycle of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Unregistered,
    Installing,
    /// Installed and waiting to take over.
    Installed,
    Activating,
    Active,
    /// Failed to install, or replaced by a newer version.
    Redundant,
}

impl WorkerState {
    /// Only an active version answers fetches; everything else declines.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Active)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Unregistered => write!(f, "unregistered"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Active => write!(f, "active"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}
