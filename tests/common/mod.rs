// common/mod.rs - Shared test utilities for the storefront suites
//
// This module provides:
// 1. A scripted in-process backend (latency per keyword, forced failures)
// 2. Polling helpers that cooperate with tokio's paused clock
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uchigift::fixtures::sample_result;
use uchigift::storefront::api::{ApiError, GiftBackend};
use uchigift::storefront::model::{AiRecommendResponse, SearchRequest, SearchResult};

/// Backend answering from the fixture catalog
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<SearchRequest>>,
    latency: Mutex<HashMap<String, Duration>>,
    failures: AtomicUsize,
    recommendation: Mutex<Option<AiRecommendResponse>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay responses for keyword `q`
    pub fn with_latency(self, q: &str, latency: Duration) -> Self {
        self.latency.lock().unwrap().insert(q.to_string(), latency);
        self
    }

    /// Make the next `count` searches fail with a 500
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn with_recommendation(self, response: AiRecommendResponse) -> Self {
        *self.recommendation.lock().unwrap() = Some(response);
        self
    }

    pub fn calls(&self) -> Vec<SearchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GiftBackend for FakeBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError> {
        self.calls.lock().unwrap().push(request.clone());

        // Decide the outcome at call time so scripted failures follow call order
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let latency = self.latency.lock().unwrap().get(&request.q).copied();

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(ApiError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(sample_result(request))
    }

    async fn recommend(&self, _user_input: &str) -> Result<AiRecommendResponse, ApiError> {
        self.recommendation
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Status {
                status: 503,
                body: "ai unavailable".to_string(),
            })
    }
}

/// Poll `condition` every virtual millisecond until it holds.
///
/// Panics after 30 s of (virtual) time.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 30s"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Let spawned tasks run for `duration` of virtual time
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}
