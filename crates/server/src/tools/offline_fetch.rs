//! offline_fetch tool implementation.
//!
//! Runs a request through the active worker the way a controlled page's
//! fetch would. Declined requests go straight to the network.

use m360_client::FetchOutcome;
use m360_client::fetch::resolve;
use m360_core::{Destination, Error, Request, RequestMode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::handler::OfflineContext;

/// Input parameters for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "document", "image", "style", "script", "font", or empty.
    #[serde(default)]
    pub destination: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors", or "cors".
    #[serde(default)]
    pub mode: Option<String>,

    /// Request body, for non-GET methods.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// "network", "cache", or "synthesized".
    pub source: String,
    /// How the worker classified the request; absent when it passed through.
    pub kind: Option<String>,
    pub intercepted: bool,
    pub body_len: usize,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

impl OfflineFetchParams {
    fn to_request(&self, ctx: &OfflineContext) -> Result<Request, Error> {
        if self.method.trim().is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        let url = resolve(&self.url, &ctx.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut request = Request::get(url).with_method(self.method.trim().to_ascii_uppercase());
        if let Some(destination) = &self.destination {
            request = request.with_destination(Destination::parse(destination));
        }
        if let Some(mode) = &self.mode {
            request = request.with_mode(RequestMode::parse(mode));
        }
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }
        Ok(request)
    }
}

/// Implementation of the offline_fetch tool.
pub async fn fetch_impl(ctx: &OfflineContext, params: OfflineFetchParams) -> Result<CallToolResult, McpError> {
    let request = params.to_request(ctx)?;

    let (response, source, kind) = match ctx.registration.handle_fetch(&request).await {
        FetchOutcome::Respond { kind, served } => (served.response, served.source.as_str(), Some(kind.as_str())),
        FetchOutcome::PassThrough => {
            tracing::debug!(method = %request.method, url = %request.url, "not intercepted, fetching directly");
            let response = ctx.network.fetch(&request).await.map_err(Error::from)?;
            (response, "network", None)
        }
    };

    let output = OfflineFetchOutput {
        url: request.url.to_string(),
        status: response.status,
        body_len: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
        source: source.to_string(),
        kind: kind.map(str::to_string),
        intercepted: kind.is_some(),
    };

    json_result(&output)
}
