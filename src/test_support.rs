//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{
    Backend, BackendError, PrivacyRequest, PrivacyResponse, SearchRequest, SearchResponse,
};
use crate::core::controller::Controller;
use crate::core::reveal::{Granularity, RevealConfig};
use crate::host::MemoryHost;

/// A backend that replays scripted results and records every request.
/// When a script runs dry it answers `"ok"`.
#[derive(Default)]
pub struct StubBackend {
    search: Mutex<VecDeque<Result<SearchResponse, BackendError>>>,
    privacy: Mutex<VecDeque<Result<PrivacyResponse, BackendError>>>,
    queries: Mutex<Vec<SearchRequest>>,
    options: Mutex<Vec<PrivacyRequest>>,
    enable_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, result: Result<SearchResponse, BackendError>) {
        self.search.lock().unwrap().push_back(result);
    }

    pub fn push_privacy(&self, result: Result<PrivacyResponse, BackendError>) {
        self.privacy.lock().unwrap().push_back(result);
    }

    pub fn queries(&self) -> Vec<SearchRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub fn submitted_options(&self) -> Vec<PrivacyRequest> {
        self.options.lock().unwrap().clone()
    }

    pub fn enable_history_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    fn next_privacy(&self) -> Result<PrivacyResponse, BackendError> {
        self.privacy.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(PrivacyResponse {
                response: "ok".to_string(),
            })
        })
    }
}

#[async_trait]
impl Backend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn query(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError> {
        self.queries.lock().unwrap().push(request.clone());
        self.search.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SearchResponse {
                response: "ok".to_string(),
                options: None,
            })
        })
    }

    async fn submit_option(
        &self,
        request: &PrivacyRequest,
    ) -> Result<PrivacyResponse, BackendError> {
        self.options.lock().unwrap().push(request.clone());
        self.next_privacy()
    }

    async fn enable_history(&self) -> Result<PrivacyResponse, BackendError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.next_privacy()
    }
}

/// Reveal speeds short enough that paused-clock tests finish quickly.
pub fn fast_reveal() -> RevealConfig {
    RevealConfig {
        cursor_speed: Duration::from_millis(2),
        accumulate_speed: Duration::from_millis(5),
        granularity: Granularity::Char,
    }
}

/// Creates a controller wired to a fresh in-memory host.
pub fn test_controller(backend: Arc<StubBackend>) -> (Controller, MemoryHost) {
    let host = MemoryHost::new();
    let controller = Controller::new(host.surfaces(), backend, fast_reveal());
    (controller, host)
}
