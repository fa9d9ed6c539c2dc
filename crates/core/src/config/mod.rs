//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (M360_*)
//! 2. TOML config file (if M360_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! List-valued fields take TOML array syntax in the environment, e.g.
//! `M360_MAPS_PATTERNS='["googleapis.com"]'`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// How install treats a manifest asset that fails to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallPolicy {
    /// Any failure fails the whole install and nothing is stored.
    #[default]
    Atomic,
    /// Store what succeeded, log what did not.
    BestEffort,
}

/// The three partition names a worker version knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    /// Versioned primary partition; bump it whenever the manifest changes.
    pub static_cache: String,
    pub image_cache: String,
    pub maps_cache: String,
}

impl CacheNames {
    pub fn all(&self) -> [&str; 3] {
        [&self.static_cache, &self.image_cache, &self.maps_cache]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (M360_*)
/// 2. TOML config file (if M360_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via M360_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the application is served from. Manifest paths resolve
    /// against it and "same-origin" is judged against it.
    ///
    /// Set via M360_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via M360_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via M360_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional cap on response body size in bytes. Unset means no cap; a
    /// response over the cap is a network failure.
    ///
    /// Set via M360_MAX_BYTES environment variable.
    #[serde(default)]
    pub max_bytes: Option<usize>,

    /// Versioned primary partition name.
    ///
    /// Set via M360_STATIC_CACHE environment variable.
    #[serde(default = "default_static_cache")]
    pub static_cache: String,

    /// Set via M360_IMAGE_CACHE environment variable.
    #[serde(default = "default_image_cache")]
    pub image_cache: String,

    /// Set via M360_MAPS_CACHE environment variable.
    #[serde(default = "default_maps_cache")]
    pub maps_cache: String,

    /// Paths pre-populated into the primary partition at install.
    ///
    /// Set via M360_MANIFEST environment variable.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Image served from the images partition when an image request fails
    /// offline.
    ///
    /// Set via M360_FALLBACK_IMAGE environment variable.
    #[serde(default = "default_fallback_image")]
    pub fallback_image: Option<String>,

    /// URL substrings identifying the maps/geolocation API.
    ///
    /// Set via M360_MAPS_PATTERNS environment variable.
    #[serde(default = "default_maps_patterns")]
    pub maps_patterns: Vec<String>,

    /// Path extensions treated as static assets.
    ///
    /// Set via M360_STATIC_EXTENSIONS environment variable.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Background sync tag the worker answers to.
    ///
    /// Set via M360_SYNC_TAG environment variable.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Set via M360_INSTALL_POLICY environment variable.
    #[serde(default)]
    pub install_policy: InstallPolicy,

    /// Concurrent manifest fetches during install.
    ///
    /// Set via M360_INSTALL_CONCURRENCY environment variable.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,

    /// Activate immediately after a successful install instead of waiting.
    ///
    /// Set via M360_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./m360-offline.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "m360-offline/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_static_cache() -> String {
    "sikkim-monasteries-v2".into()
}

fn default_image_cache() -> String {
    "images-v1".into()
}

fn default_maps_cache() -> String {
    "maps-v1".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/manifest.json",
        "/src/main.tsx",
        "/src/index.css",
        "/src/App.tsx",
        "/src/components/Homepage.tsx",
        "/src/components/InteractiveMap.tsx",
        "/src/components/VirtualTours.tsx",
        "/src/components/AudioGuide.tsx",
        "/src/components/DigitalArchives.tsx",
        "/src/components/CulturalCalendar.tsx",
        "/src/components/BlogSection.tsx",
        "/src/components/BusScheduling.tsx",
        "/src/components/WeatherForecast.tsx",
        "/src/components/Navigation.tsx",
        "/src/assets/sikkim-monasteries-hero.jpg",
        "/src/assets/monastery-1.jpg",
        "/src/assets/monastery-2.jpg",
        "/src/assets/monastery-3.jpg",
        "/src/assets/monastery-logo.png",
        "/src/assets/virtual-tours-hero.jpg",
        "/src/assets/audio-guide-hero.jpg",
        "/src/assets/digital-archives-hero.jpg",
        "/src/assets/cultural-calendar-hero.jpg",
        "/lovable-uploads/monastery-1.jpg",
        "/lovable-uploads/monastery-2.jpg",
        "/lovable-uploads/monastery-3.jpg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fallback_image() -> Option<String> {
    Some("/lovable-uploads/monastery-1.jpg".into())
}

fn default_maps_patterns() -> Vec<String> {
    vec!["googleapis.com".into(), "google.com/maps".into()]
}

fn default_static_extensions() -> Vec<String> {
    vec!["css".into(), "js".into(), "tsx".into(), "json".into()]
}

fn default_sync_tag() -> String {
    "background-sync".into()
}

fn default_install_concurrency() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: None,
            static_cache: default_static_cache(),
            image_cache: default_image_cache(),
            maps_cache: default_maps_cache(),
            manifest: default_manifest(),
            fallback_image: default_fallback_image(),
            maps_patterns: default_maps_patterns(),
            static_extensions: default_static_extensions(),
            sync_tag: default_sync_tag(),
            install_policy: InstallPolicy::default(),
            install_concurrency: default_install_concurrency(),
            skip_waiting: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_names(&self) -> CacheNames {
        CacheNames {
            static_cache: self.static_cache.clone(),
            image_cache: self.image_cache.clone(),
            maps_cache: self.maps_cache.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `M360_`
    /// 2. TOML file from `M360_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("M360_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("M360_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
