//! cache_purge tool implementation.
//!
//! Deletes one partition outright. Entries never expire on their own.

use m360_core::{CacheDb, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Name of the partition to delete.
    pub partition: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub partition: String,
    /// False when no partition had that name.
    pub deleted: bool,
    /// Number of entries removed with it.
    pub entries: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.partition.trim().is_empty() {
        return Err(Error::InvalidInput("partition cannot be empty".to_string()).into());
    }

    let entries = cache.entry_count(&params.partition).await?;
    let deleted = cache.delete_partition(&params.partition).await?;
    tracing::info!(partition = %params.partition, deleted, entries, "purged partition");

    let output = CachePurgeOutput { partition: params.partition, deleted, entries: if deleted { entries } else { 0 } };
    json_result(&output)
}
