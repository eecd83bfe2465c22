//! In-memory request metrics.
//!
//! Counters keyed by name in a [`DashMap`], plus a bounded ring buffer of
//! recent request samples. Exposed as JSON at `/metrics/json`; no external
//! metrics backend is involved.

use axum::{extract::Request, middleware::Next, response::Response};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

const RECENT_SAMPLES: usize = 100;

#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// One completed HTTP request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSample {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub latency_ms: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct MetricsRegistry {
    counters: DashMap<String, Counter>,
    recent: Mutex<VecDeque<RequestSample>>,
    started_at: DateTime<Utc>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_SAMPLES)),
            started_at: Utc::now(),
        }
    }

    pub fn increment(&self, name: &str) {
        self.counters.entry(name.to_string()).or_default().inc();
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).map(|c| c.get()).unwrap_or(0)
    }

    pub fn record_request(&self, sample: RequestSample) {
        self.increment("http_requests_total");
        self.increment(&format!("http_responses_{}xx", sample.status / 100));
        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == RECENT_SAMPLES {
                recent.pop_front();
            }
            recent.push_back(sample);
        }
    }

    /// JSON snapshot: all counters plus the recent-request ring buffer.
    pub fn snapshot(&self) -> serde_json::Value {
        let counters: serde_json::Map<String, serde_json::Value> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), json!(entry.value().get())))
            .collect();

        let recent: Vec<RequestSample> = self
            .recent
            .lock()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();

        json!({
            "started_at": self.started_at,
            "uptime_secs": (Utc::now() - self.started_at).num_seconds(),
            "counters": counters,
            "recent_requests": recent,
        })
    }
}

/// Axum middleware recording method, path, status and latency for every
/// request. The registry is pulled from request extensions.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let registry = request.extensions().get::<Arc<MetricsRegistry>>().cloned();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(registry) = registry {
        registry.record_request(RequestSample {
            method,
            path,
            status: response.status().as_u16(),
            latency_ms: start.elapsed().as_millis() as u64,
            at: Utc::now(),
        });
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: u16) -> RequestSample {
        RequestSample {
            method: "GET".into(),
            path: "/health".into(),
            status,
            latency_ms: 3,
            at: Utc::now(),
        }
    }

    #[test]
    fn counters_accumulate() {
        let registry = MetricsRegistry::new();
        registry.record_request(sample(200));
        registry.record_request(sample(200));
        registry.record_request(sample(404));

        assert_eq!(registry.counter("http_requests_total"), 3);
        assert_eq!(registry.counter("http_responses_2xx"), 2);
        assert_eq!(registry.counter("http_responses_4xx"), 1);
        assert_eq!(registry.counter("http_responses_5xx"), 0);
    }

    #[test]
    fn ring_buffer_is_bounded() {
        let registry = MetricsRegistry::new();
        for _ in 0..(RECENT_SAMPLES + 20) {
            registry.record_request(sample(200));
        }

        let snapshot = registry.snapshot();
        let recent = snapshot["recent_requests"].as_array().unwrap();
        assert_eq!(recent.len(), RECENT_SAMPLES);
        assert_eq!(
            snapshot["counters"]["http_requests_total"],
            (RECENT_SAMPLES + 20) as u64
        );
    }
}
