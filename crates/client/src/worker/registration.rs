//! Which worker version controls the origin.
//!
//! At most one version is active. A newly installed version either takes
//! over immediately (skip-waiting, or nothing active yet) or is parked as
//! waiting until [`Registration::promote_waiting`] is called.

use std::sync::Arc;

use m360_core::{Error, Request};
use tokio::sync::RwLock;

use super::{ActivateReport, FetchOutcome, InstallReport, OfflineWorker};

/// Result of registering a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterReport {
    pub install: InstallReport,
    /// Present when the version was activated as part of registering.
    pub activate: Option<ActivateReport>,
}

#[derive(Default)]
pub struct Registration {
    active: RwLock<Option<Arc<OfflineWorker>>>,
    waiting: RwLock<Option<Arc<OfflineWorker>>>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active(&self) -> Option<Arc<OfflineWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<OfflineWorker>> {
        self.waiting.read().await.clone()
    }

    /// Install `worker` and, if allowed, activate it.
    ///
    /// # Errors
    ///
    /// Install or activation failure. On install failure the previously
    /// active version keeps serving.
    pub async fn register(&self, worker: OfflineWorker) -> Result<RegisterReport, Error> {
        let worker = Arc::new(worker);
        let install = worker.install().await?;

        let nothing_active = self.active.read().await.is_none();
        if install.skip_waiting || nothing_active {
            let activate = self.promote(worker).await?;
            return Ok(RegisterReport { install, activate: Some(activate) });
        }

        tracing::info!(version = worker.version(), "installed version waiting");
        let replaced = self.waiting.write().await.replace(worker);
        if let Some(old) = replaced {
            old.retire().await;
        }
        Ok(RegisterReport { install, activate: None })
    }

    /// Activate the waiting version, if any, once old clients are gone.
    pub async fn promote_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        let Some(worker) = self.waiting.write().await.take() else {
            return Ok(None);
        };
        self.promote(worker).await.map(Some)
    }

    /// Activate `worker` and make it the active version. If activation fails
    /// the worker is parked as waiting, unless a newer version already is.
    async fn promote(&self, worker: Arc<OfflineWorker>) -> Result<ActivateReport, Error> {
        let report = match worker.activate().await {
            Ok(report) => report,
            Err(e) => {
                let mut waiting = self.waiting.write().await;
                if waiting.is_none() {
                    *waiting = Some(worker);
                } else {
                    worker.retire().await;
                }
                return Err(e);
            }
        };
        let previous = self.active.write().await.replace(worker);
        if let Some(old) = previous {
            old.retire().await;
        }
        Ok(report)
    }

    /// Route a fetch to the active version; decline when there is none.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        match self.active().await {
            Some(worker) => worker.handle_fetch(request).await,
            None => FetchOutcome::PassThrough,
        }
    }

    /// Route a sync event to the active version.
    pub async fn sync(&self, tag: &str) -> Result<bool, Error> {
        match self.active().await {
            Some(worker) => worker.sync(tag).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use crate::testing::{ScriptedNetwork, ok};
    use crate::worker::WorkerState;
    use m360_core::{AppConfig, CacheDb, CacheStorage, Response};
    use std::sync::atomic::{AtomicBool, Ordering};
    use url::Url;

    fn app(version: &str, manifest: &[&str], skip_waiting: bool) -> AppConfig {
        AppConfig {
            origin: "https://m360.example".into(),
            static_cache: version.into(),
            manifest: manifest.iter().map(|s| s.to_string()).collect(),
            skip_waiting,
            ..Default::default()
        }
    }

    fn worker(
        version: &str, manifest: &[&str], skip_waiting: bool, db: &CacheDb, net: &Arc<ScriptedNetwork>,
    ) -> OfflineWorker {
        let app = app(version, manifest, skip_waiting);
        OfflineWorker::new(WorkerConfig::from_app(&app).unwrap(), Arc::new(db.clone()), net.clone())
    }

    /// Partition store whose listing can be made to fail, which fails
    /// activation.
    struct FlakyStorage {
        db: CacheDb,
        fail_keys: AtomicBool,
    }

    #[async_trait::async_trait]
    impl CacheStorage for FlakyStorage {
        async fn open(&self, name: &str) -> Result<(), Error> {
            self.db.open_partition(name).await
        }

        async fn keys(&self) -> Result<Vec<String>, Error> {
            if self.fail_keys.load(Ordering::SeqCst) {
                return Err(Error::InvalidState("partition listing unavailable".into()));
            }
            self.db.partition_names().await
        }

        async fn delete(&self, name: &str) -> Result<bool, Error> {
            self.db.delete_partition(name).await
        }

        async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
            self.db.match_entry(name, request).await
        }

        async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
            self.db.match_any(request).await
        }

        async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
            self.db.put_entry(name, request, response).await
        }

        async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
            self.db.put_entries(name, entries).await
        }
    }

    #[tokio::test]
    async fn test_first_version_activates_even_when_waiting() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::new());
        let registration = Registration::new();

        let report = registration.register(worker("static-v1", &[], false, &db, &net)).await.unwrap();
        assert!(report.activate.is_some());
        assert_eq!(registration.active().await.unwrap().version(), "static-v1");
    }

    #[tokio::test]
    async fn test_skip_waiting_replaces_active() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::new());
        let registration = Registration::new();

        registration.register(worker("static-v1", &[], true, &db, &net)).await.unwrap();
        let old = registration.active().await.unwrap();
        let report = registration.register(worker("static-v2", &[], true, &db, &net)).await.unwrap();

        assert_eq!(report.activate.unwrap().deleted, vec!["static-v1".to_string()]);
        assert_eq!(registration.active().await.unwrap().version(), "static-v2");
        assert_eq!(old.state().await, WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_waiting_until_promoted() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::new());
        let registration = Registration::new();

        registration.register(worker("static-v1", &[], false, &db, &net)).await.unwrap();
        let report = registration.register(worker("static-v2", &[], false, &db, &net)).await.unwrap();
        assert!(report.activate.is_none());
        assert_eq!(registration.active().await.unwrap().version(), "static-v1");
        assert_eq!(registration.waiting().await.unwrap().state().await, WorkerState::Installed);

        let promoted = registration.promote_waiting().await.unwrap().unwrap();
        assert_eq!(promoted.version, "static-v2");
        assert!(registration.waiting().await.is_none());
        assert_eq!(registration.active().await.unwrap().version(), "static-v2");
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_active() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::new());
        net.route("https://m360.example/", ok("text/html", "<html>v1</html>"));
        let registration = Registration::new();

        registration.register(worker("static-v1", &["/"], true, &db, &net)).await.unwrap();
        let result = registration.register(worker("static-v2", &["/", "/gone.js"], true, &db, &net)).await;

        assert!(matches!(result, Err(Error::InstallFailed { .. })));
        assert_eq!(registration.active().await.unwrap().version(), "static-v1");
        assert!(db.has_partition("static-v1").await.unwrap());

        net.set_online(false);
        let home = Request::navigate(Url::parse("https://m360.example/").unwrap());
        let outcome = registration.handle_fetch(&home).await;
        let served = outcome.served().unwrap();
        assert_eq!(served.response.body.as_ref(), b"<html>v1</html>");
    }

    #[tokio::test]
    async fn test_no_active_declines() {
        let registration = Registration::new();
        let outcome = registration.handle_fetch(&Request::get(Url::parse("https://m360.example/").unwrap())).await;
        assert!(outcome.is_pass_through());
        assert!(!registration.sync("background-sync").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_promotion_keeps_version_waiting() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = Arc::new(ScriptedNetwork::new());
        let registration = Registration::new();
        registration.register(worker("static-v1", &[], false, &db, &net)).await.unwrap();

        let storage = Arc::new(FlakyStorage { db: db.clone(), fail_keys: AtomicBool::new(false) });
        let config = WorkerConfig::from_app(&app("static-v2", &[], false)).unwrap();
        registration
            .register(OfflineWorker::new(config, storage.clone(), net.clone()))
            .await
            .unwrap();

        storage.fail_keys.store(true, Ordering::SeqCst);
        assert!(registration.promote_waiting().await.is_err());
        let waiting = registration.waiting().await.unwrap();
        assert_eq!(waiting.version(), "static-v2");
        assert_eq!(waiting.state().await, WorkerState::Installed);
        assert_eq!(registration.active().await.unwrap().version(), "static-v1");

        storage.fail_keys.store(false, Ordering::SeqCst);
        let report = registration.promote_waiting().await.unwrap().unwrap();
        assert_eq!(report.version, "static-v2");
        assert_eq!(registration.active().await.unwrap().version(), "static-v2");
    }
}
