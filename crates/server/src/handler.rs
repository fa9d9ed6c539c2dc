//! MCP server handler implementation.
//!
//! Routes tool calls to the implementations in [`crate::tools`]. The handler
//! owns the partition store, the network, and the registration that decides
//! which worker version answers fetches.
use std::sync::Arc;

use crate::tools::background_sync::{BackgroundSyncParams, sync_impl};
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::offline_fetch::{OfflineFetchParams, fetch_impl};
use crate::tools::worker_status::status_impl;

use m360_client::{Network, Registration};
use m360_core::{CacheDb, CacheNames};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use url::Url;

/// Everything the tools need, shared across calls.
pub struct OfflineContext {
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    pub registration: Registration,
    pub names: CacheNames,
    pub origin: Url,
    pub sync_tag: String,
}

/// The main MCP server handler for m360-offline.
#[derive(Clone)]
pub struct OfflineServer {
    ctx: Arc<OfflineContext>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OfflineServer {
    pub fn new(ctx: OfflineContext) -> Self {
        Self { ctx: Arc::new(ctx), tool_router: Self::tool_router() }
    }

    /// Run one request through the active worker.
    #[tool(
        description = "Fetch a URL the way a controlled page would: through the active offline worker, falling back to the network for requests it declines. Returns status, headers, body, and whether the response came from the network, a cache partition, or was synthesized."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Report the active and waiting worker versions, current cache names, and entry counts per partition.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.ctx).await
    }

    #[tool(description = "Look up a stored response by partition name and URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Delete a cache partition and every entry in it.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.ctx.db, params.0).await
    }

    #[tool(description = "Dispatch a background-sync event to the active worker.")]
    async fn background_sync(&self, params: Parameters<BackgroundSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.ctx, params.0).await
    }
}

impl ServerHandler for OfflineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "m360-offline".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
