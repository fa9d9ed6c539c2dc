//! Manifest precaching for the install transition.

use std::sync::Arc;

use m360_core::{CacheStorage, Error, InstallPolicy, Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::WorkerConfig;
use crate::fetch::Network;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub version: String,
    /// Manifest entries now stored in the primary partition.
    pub cached: usize,
    /// Manifest URLs skipped under the best-effort policy.
    pub failed: Vec<String>,
    pub skip_waiting: bool,
}

type Fetched = (usize, Request, Result<Response, String>);

/// Fetch every manifest URL with bounded concurrency and write the results
/// to the primary partition in one batch.
pub(super) async fn precache(
    config: &WorkerConfig, storage: &dyn CacheStorage, network: &Arc<dyn Network>,
) -> Result<InstallReport, Error> {
    let partition = &config.names.static_cache;
    storage.open(partition).await?;

    let semaphore = Arc::new(Semaphore::new(config.install_concurrency));
    let mut join_set: JoinSet<Fetched> = JoinSet::new();

    // Permits are taken inside each task; tasks still waiting for one are
    // aborted on an atomic failure.
    for (index, url) in config.manifest.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let network = Arc::clone(network);

        join_set.spawn(async move {
            let request = Request::get(url);
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (index, request, Err(format!("install semaphore closed: {e}"))),
            };
            let result = match network.fetch(&request).await {
                Ok(response) if response.is_ok() => Ok(response),
                Ok(response) => Err(format!("status {}", response.status)),
                Err(e) => Err(e.to_string()),
            };
            (index, request, result)
        });
    }

    let mut slots: Vec<Option<(Request, Response)>> = (0..config.manifest.len()).map(|_| None).collect();
    let mut failed = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        let (index, request, result) = joined.map_err(|e| Error::InstallFailed {
            url: "<manifest task>".into(),
            reason: e.to_string(),
        })?;

        match result {
            Ok(response) => slots[index] = Some((request, response)),
            Err(reason) => match config.install_policy {
                InstallPolicy::Atomic => {
                    join_set.shutdown().await;
                    return Err(Error::InstallFailed { url: request.url.to_string(), reason });
                }
                InstallPolicy::BestEffort => {
                    tracing::warn!(url = %request.url, %reason, "skipping manifest asset");
                    failed.push(request.url.to_string());
                }
            },
        }
    }

    let entries: Vec<(Request, Response)> = slots.into_iter().flatten().collect();
    storage.put_all(partition, &entries).await?;

    Ok(InstallReport {
        version: config.version().to_string(),
        cached: entries.len(),
        failed,
        skip_waiting: config.skip_waiting,
    })
}
