//! worker_status tool implementation.

use std::sync::Arc;

use m360_client::OfflineWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::handler::OfflineContext;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VersionStatus {
    pub version: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionStatus {
    pub name: String,
    pub entries: u64,
    /// Whether the current version keeps this partition on activation.
    pub current: bool,
}

/// Output structure for worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub active: Option<VersionStatus>,
    pub waiting: Option<VersionStatus>,
    pub cache_names: Vec<String>,
    pub partitions: Vec<PartitionStatus>,
}

async fn describe(worker: Option<Arc<OfflineWorker>>) -> Option<VersionStatus> {
    let worker = worker?;
    Some(VersionStatus { version: worker.version().to_string(), state: worker.state().await.to_string() })
}

/// Implementation of the worker_status tool.
pub async fn status_impl(ctx: &OfflineContext) -> Result<CallToolResult, McpError> {
    let mut partitions = Vec::new();
    for name in ctx.db.partition_names().await? {
        let entries = ctx.db.entry_count(&name).await?;
        let current = ctx.names.contains(&name);
        partitions.push(PartitionStatus { name, entries, current });
    }

    let output = WorkerStatusOutput {
        active: describe(ctx.registration.active().await).await,
        waiting: describe(ctx.registration.waiting().await).await,
        cache_names: ctx.names.all().iter().map(|name| name.to_string()).collect(),
        partitions,
    };

    json_result(&output)
}
