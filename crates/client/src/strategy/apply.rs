//! Strategy execution against a partition store and a network.
//!
//! Every path ends in a concrete response. Store failures are logged and
//! treated as misses (on read) or skipped (on write); network failures fall
//! through to the cache and then to a synthesized response.

use m360_core::{CacheStorage, Request, Response};
use serde::{Deserialize, Serialize};

use super::{CachingStrategy, Fallback, Lookup, StorePolicy};
use crate::fetch::{Network, is_same_origin};
use crate::offline;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

/// A response handed back to the page, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn network(response: Response) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    fn cache(response: Response) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    fn synthesized(response: Response) -> Self {
        Self { response, source: ResponseSource::Synthesized }
    }
}

async fn lookup_in(storage: &dyn CacheStorage, partition: &str, request: &Request) -> Option<Response> {
    match storage.match_in(partition, request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(partition, url = %request.url, error = %e, "cache lookup failed");
            None
        }
    }
}

async fn lookup_any(storage: &dyn CacheStorage, request: &Request) -> Option<Response> {
    match storage.match_any(request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
            None
        }
    }
}

async fn store(storage: &dyn CacheStorage, partition: &str, request: &Request, response: &Response) {
    if !response.is_cacheable() {
        return;
    }
    if let Err(e) = storage.put(partition, request, response).await {
        tracing::warn!(partition, url = %request.url, error = %e, "cache put failed");
    }
}

async fn fall_back(storage: &dyn CacheStorage, partition: &str, fallback: &Fallback) -> Served {
    match fallback {
        Fallback::CachedAsset(url) => match lookup_in(storage, partition, &Request::get(url.clone())).await {
            Some(response) => Served::cache(response),
            None => Served::synthesized(offline::not_found()),
        },
        Fallback::NotFound => Served::synthesized(offline::not_found()),
        Fallback::EmptyJson => Served::synthesized(offline::empty_json()),
        Fallback::OfflinePage => Served::synthesized(offline::offline_page()),
        Fallback::ServiceUnavailable => Served::synthesized(offline::service_unavailable()),
    }
}

/// Execute `strategy` for `request`. One network attempt at most.
pub async fn apply(
    strategy: &CachingStrategy, request: &Request, storage: &dyn CacheStorage, network: &dyn Network,
) -> Served {
    match strategy {
        CachingStrategy::CacheFirst { partition, fallback } => {
            if let Some(hit) = lookup_in(storage, partition, request).await {
                tracing::debug!(partition = %partition, url = %request.url, "cache hit");
                return Served::cache(hit);
            }

            match network.fetch(request).await {
                Ok(response) => {
                    store(storage, partition, request, &response).await;
                    Served::network(response)
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "network failed on cache miss");
                    fall_back(storage, partition, fallback).await
                }
            }
        }
        CachingStrategy::NetworkFirst { partition, store: policy, lookup, fallback } => {
            match network.fetch(request).await {
                Ok(response) => {
                    let storable = match policy {
                        StorePolicy::Always => true,
                        StorePolicy::SameOrigin(origin) => is_same_origin(&request.url, origin),
                    };
                    if storable {
                        store(storage, partition, request, &response).await;
                    }
                    Served::network(response)
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "network failed, trying cache");
                    let cached = match lookup {
                        Lookup::Partition => lookup_in(storage, partition, request).await,
                        Lookup::AnyPartition => lookup_any(storage, request).await,
                    };
                    match cached {
                        Some(hit) => Served::cache(hit),
                        None => fall_back(storage, partition, fallback).await,
                    }
                }
            }
        }
    }
}
