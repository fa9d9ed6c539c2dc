//! Shared fixtures for tool tests.

use std::sync::Arc;

use m360_client::Registration;
pub(crate) use m360_client::testing::ScriptedNetwork;
use m360_core::{AppConfig, CacheDb, Response};
use rmcp::model::CallToolResult;
use url::Url;

use crate::handler::OfflineContext;

pub(crate) const ORIGIN: &str = "https://m360.example";

pub(crate) fn app() -> AppConfig {
    AppConfig { origin: ORIGIN.into(), manifest: vec!["/".into()], ..Default::default() }
}

pub(crate) fn html(body: &str) -> Response {
    m360_client::testing::ok("text/html", body.to_string())
}

/// Context with no active worker and an online stub network.
pub(crate) async fn context() -> OfflineContext {
    context_with(Arc::new(ScriptedNetwork::new())).await
}

pub(crate) async fn context_with(network: Arc<ScriptedNetwork>) -> OfflineContext {
    let app = app();
    OfflineContext {
        db: CacheDb::open_in_memory().await.unwrap(),
        network,
        registration: Registration::new(),
        names: app.cache_names(),
        origin: Url::parse(ORIGIN).unwrap(),
        sync_tag: app.sync_tag.clone(),
    }
}

/// Context whose worker precached `/` and is active.
pub(crate) async fn active_context(network: Arc<ScriptedNetwork>) -> OfflineContext {
    network.route(&format!("{ORIGIN}/"), html("<html>home</html>"));
    let ctx = context_with(network.clone()).await;
    let worker = m360_client::OfflineWorker::new(
        m360_client::WorkerConfig::from_app(&app()).unwrap(),
        Arc::new(ctx.db.clone()),
        network,
    );
    ctx.registration.register(worker).await.unwrap();
    ctx
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
