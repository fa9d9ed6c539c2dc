//! Network side of the interceptor.
//!
//! ### The `Network` seam
//! - The worker only ever talks to the network through [`Network`], so the
//!   decision tree runs unchanged against a scripted stub in tests.
//! - A transport failure is a [`NetworkError`]; any HTTP status, including
//!   404 or 500, is a successful fetch and is handed back as a `Response`.
//!
//! ### `FetchClient`
//! - reqwest over rustls with gzip/brotli/deflate decoding.
//! - Max redirects: 5
//! - Request timeout and body size limit come from `FetchConfig`.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, is_same_origin, parse_origin, resolve};

use m360_core::{Error, Request, Response};

/// Error type for a single network attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        Error::Network(err.to_string())
    }
}

/// Something that can perform one network attempt for a request.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "m360-offline/0.1")
    pub user_agent: String,

    /// Optional response body cap in bytes (default: none). The worker
    /// answers pages with whatever the network returns, so this stays unset
    /// unless a deployment asks for it.
    pub max_bytes: Option<usize>,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "m360-offline/0.1".to_string(),
            max_bytes: None,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app(config: &m360_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn to_response(status: u16, headers: &header::HeaderMap, body: Bytes) -> Response {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        Response::new(status, headers, body)
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if let Some(limit) = self.config.max_bytes
            && let Some(len) = response.content_length()
            && len as usize > limit
        {
            return Err(NetworkError::TooLarge { size: len, limit });
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if let Some(limit) = self.config.max_bytes
            && bytes.len() > limit
        {
            return Err(NetworkError::TooLarge { size: bytes.len() as u64, limit });
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Self::to_response(status, &headers, bytes))
    }
}
