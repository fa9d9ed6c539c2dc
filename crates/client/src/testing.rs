//! Scripted network for tests, here and in dependent crates (enable the
//! `testing` feature).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use m360_core::{Request, Response};

use crate::fetch::{Network, NetworkError};

/// Answers from a fixed route table; unknown URLs get a 404. Can be switched
/// offline, and counts every attempt.
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl Default for ScriptedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: AtomicUsize::new(0) }
    }

    /// Answer `url` with `response` from now on.
    pub fn route(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect("offline".into()));
        }
        let routes = self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, Vec::new(), "")))
    }
}

/// A 200 response with the given content type.
pub fn ok(content_type: &str, body: impl Into<bytes::Bytes>) -> Response {
    Response::new(200, vec![("Content-Type".into(), content_type.into())], body)
}
