//! cache_get tool implementation.
//!
//! Retrieves a stored response by partition and URL.

use m360_client::fetch::resolve;
use m360_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::handler::OfflineContext;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Partition name, e.g. "images-v1".
    pub partition: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub partition: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(ctx: &OfflineContext, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    if params.partition.trim().is_empty() {
        return Err(Error::InvalidInput("partition cannot be empty".into()).into());
    }
    let url = resolve(&params.url, &ctx.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::get(url);

    let response = ctx
        .db
        .match_entry(&params.partition, &request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} in {}", request.url, params.partition)))?;

    let output = CacheGetOutput {
        partition: params.partition,
        url: request.url.to_string(),
        status: response.status,
        body_len: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
    };

    json_result(&output)
}
