//! Resolved per-version worker configuration.

use m360_core::{AppConfig, CacheNames, Error, InstallPolicy};
use url::Url;

use crate::classify::ClassifyRules;
use crate::fetch::{parse_origin, resolve};

/// Everything one worker version needs, with manifest paths already resolved
/// against the origin.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub names: CacheNames,
    pub manifest: Vec<Url>,
    pub fallback_image: Option<Url>,
    pub rules: ClassifyRules,
    pub sync_tag: String,
    pub install_policy: InstallPolicy,
    pub install_concurrency: usize,
    pub skip_waiting: bool,
}

impl WorkerConfig {
    /// Resolve an [`AppConfig`] into a worker configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin, a manifest entry, or the
    /// fallback image cannot be resolved.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;

        let manifest = config
            .manifest
            .iter()
            .map(|path| resolve(path, &origin).map_err(|e| Error::InvalidUrl(format!("manifest {path}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let fallback_image = config
            .fallback_image
            .as_deref()
            .map(|path| resolve(path, &origin).map_err(|e| Error::InvalidUrl(format!("fallback_image: {e}"))))
            .transpose()?;

        Ok(Self {
            origin,
            names: config.cache_names(),
            manifest,
            fallback_image,
            rules: ClassifyRules::from_app(config),
            sync_tag: config.sync_tag.clone(),
            install_policy: config.install_policy,
            install_concurrency: config.install_concurrency.max(1),
            skip_waiting: config.skip_waiting,
        })
    }

    /// Version label for logs and status: the primary partition name.
    pub fn version(&self) -> &str {
        &self.names.static_cache
    }
}
