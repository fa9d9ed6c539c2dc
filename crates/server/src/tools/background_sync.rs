//! background_sync tool implementation.
//!
//! Dispatches a sync event to the active worker. Tags other than the
//! configured one are acknowledged but not handled.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::handler::OfflineContext;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundSyncParams {
    /// Sync tag; defaults to the configured tag.
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundSyncOutput {
    pub tag: String,
    /// True when an active worker owned the tag and ran its sync routine.
    pub handled: bool,
}

pub async fn sync_impl(ctx: &OfflineContext, params: BackgroundSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.unwrap_or_else(|| ctx.sync_tag.clone());
    let handled = ctx.registration.sync(&tag).await?;
    json_result(&BackgroundSyncOutput { tag, handled })
}
