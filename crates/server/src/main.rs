//! m360-offline server entry point.
//!
//! Boots the MCP server on stdio transport with one offline worker version
//! registered. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use m360_client::{FetchClient, FetchConfig, Network, OfflineWorker, Registration, WorkerConfig};
use m360_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let worker_config = WorkerConfig::from_app(&config)?;
    tracing::info!(
        version = worker_config.version(),
        origin = %worker_config.origin,
        "starting m360-offline on stdio transport"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from_app(&config))?);

    let registration = Registration::new();
    let worker = OfflineWorker::new(worker_config.clone(), Arc::new(db.clone()), Arc::clone(&network));
    if let Err(e) = registration.register(worker).await {
        tracing::error!(error = %e, "worker registration failed, requests will go to the network");
    }

    let ctx = handler::OfflineContext {
        db,
        network,
        registration,
        names: config.cache_names(),
        origin: worker_config.origin,
        sync_tag: worker_config.sync_tag,
    };

    let server = serve_server(handler::OfflineServer::new(ctx), stdio()).await?;
    server.waiting().await?;

    Ok(())
}
