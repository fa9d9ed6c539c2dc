//! Request classification.
//!
//! First match wins, in this order:
//! 1. non-GET or non-http(s) scheme (browser extensions etc.) → not intercepted
//! 2. image destination
//! 3. maps/geolocation API URL
//! 4. stylesheet, script, or a static file extension
//! 5. document navigation
//! 6. anything else

use m360_core::{Destination, Request, RequestMode};
use serde::{Deserialize, Serialize};

/// What the interceptor considers a request to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    MapsApi,
    StaticAsset,
    Navigation,
    Other,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::MapsApi => "maps_api",
            ResourceKind::StaticAsset => "static_asset",
            ResourceKind::Navigation => "navigation",
            ResourceKind::Other => "other",
        }
    }
}

/// Matching rules for the URL-based branches of the classifier.
#[derive(Debug, Clone, Default)]
pub struct ClassifyRules {
    /// Substrings of the full URL that identify the maps API.
    pub maps_patterns: Vec<String>,
    /// Lowercase path extensions, without the dot.
    pub static_extensions: Vec<String>,
}

impl ClassifyRules {
    pub fn from_app(config: &m360_core::AppConfig) -> Self {
        Self {
            maps_patterns: config.maps_patterns.clone(),
            static_extensions: config
                .static_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_maps(&self, request: &Request) -> bool {
        let url = request.url.as_str();
        self.maps_patterns.iter().any(|pattern| url.contains(pattern.as_str()))
    }

    fn has_static_extension(&self, request: &Request) -> bool {
        let Some(segment) = request.url.path_segments().and_then(|mut segments| segments.next_back()) else {
            return false;
        };
        let Some((_, ext)) = segment.rsplit_once('.') else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.static_extensions.iter().any(|known| *known == ext)
    }
}

/// Classify `request`, or return `None` if it must pass through untouched.
pub fn classify(request: &Request, rules: &ClassifyRules) -> Option<ResourceKind> {
    if !request.is_get() || !matches!(request.url.scheme(), "http" | "https") {
        return None;
    }

    let kind = if request.destination == Destination::Image {
        ResourceKind::Image
    } else if rules.is_maps(request) {
        ResourceKind::MapsApi
    } else if matches!(request.destination, Destination::Style | Destination::Script)
        || rules.has_static_extension(request)
    {
        ResourceKind::StaticAsset
    } else if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
        ResourceKind::Navigation
    } else {
        ResourceKind::Other
    };

    Some(kind)
}
