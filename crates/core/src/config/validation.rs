//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - any cache name is empty, or two of them collide
    /// - a manifest entry is blank
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is set to 0
    /// - `user_agent` or `sync_tag` is empty
    /// - `install_concurrency` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme()))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        let names = self.cache_names();
        for (field, name) in [
            ("static_cache", &names.static_cache),
            ("image_cache", &names.image_cache),
            ("maps_cache", &names.maps_cache),
        ] {
            if name.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }
        if names.static_cache == names.image_cache
            || names.static_cache == names.maps_cache
            || names.image_cache == names.maps_cache
        {
            return Err(invalid("static_cache", "cache names must be distinct"));
        }

        if self.manifest.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("manifest", "entries must not be blank"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == Some(0) {
            return Err(invalid("max_bytes", "must be greater than 0 when set"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.sync_tag.is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }

        if self.install_concurrency == 0 {
            return Err(invalid("install_concurrency", "must be at least 1"));
        }

        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; install will only create the primary partition");
        }

        Ok(())
    }
}
