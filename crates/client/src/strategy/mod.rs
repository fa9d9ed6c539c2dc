//! Caching policy: which strategy serves which kind of request.
//!
//! Policy lives here and is a pure function of the request kind and the
//! worker configuration; the mechanism that executes a strategy against the
//! store and the network is in [`apply`].

pub mod apply;

pub use apply::{ResponseSource, Served, apply};

use url::Url;

use crate::classify::ResourceKind;
use crate::config::WorkerConfig;

/// Which entries a network-first strategy writes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorePolicy {
    /// Every 200 response.
    Always,
    /// Only 200 responses from this origin.
    SameOrigin(Url),
}

/// Where a network-first strategy looks when the network fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The strategy's own partition.
    Partition,
    /// Every partition, oldest first.
    AnyPartition,
}

/// What to serve when neither network nor cache produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// A designated entry in the strategy's partition, else 404.
    CachedAsset(Url),
    NotFound,
    EmptyJson,
    OfflinePage,
    ServiceUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachingStrategy {
    /// Serve from `partition` when present without touching the network;
    /// otherwise fetch and store 200 responses.
    CacheFirst { partition: String, fallback: Fallback },
    /// Always try the network, store 200 responses per `store`, and fall
    /// back to the cache only on transport failure.
    NetworkFirst { partition: String, store: StorePolicy, lookup: Lookup, fallback: Fallback },
}

impl CachingStrategy {
    pub fn partition(&self) -> &str {
        match self {
            CachingStrategy::CacheFirst { partition, .. } | CachingStrategy::NetworkFirst { partition, .. } => {
                partition
            }
        }
    }
}

/// Pick the strategy for a request kind.
pub fn strategy(kind: ResourceKind, config: &WorkerConfig) -> CachingStrategy {
    let names = &config.names;
    match kind {
        ResourceKind::Image => CachingStrategy::CacheFirst {
            partition: names.image_cache.clone(),
            fallback: config
                .fallback_image
                .clone()
                .map_or(Fallback::NotFound, Fallback::CachedAsset),
        },
        ResourceKind::MapsApi => CachingStrategy::NetworkFirst {
            partition: names.maps_cache.clone(),
            store: StorePolicy::Always,
            lookup: Lookup::Partition,
            fallback: Fallback::EmptyJson,
        },
        ResourceKind::StaticAsset => {
            CachingStrategy::CacheFirst { partition: names.static_cache.clone(), fallback: Fallback::NotFound }
        }
        ResourceKind::Navigation => CachingStrategy::NetworkFirst {
            partition: names.static_cache.clone(),
            store: StorePolicy::Always,
            lookup: Lookup::Partition,
            fallback: Fallback::OfflinePage,
        },
        ResourceKind::Other => CachingStrategy::NetworkFirst {
            partition: names.static_cache.clone(),
            store: StorePolicy::SameOrigin(config.origin.clone()),
            lookup: Lookup::AnyPartition,
            fallback: Fallback::ServiceUnavailable,
        },
    }
}
