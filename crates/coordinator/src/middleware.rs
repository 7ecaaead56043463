//! Request accounting and heartbeat validation for the coordinator API

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use region_core::{CatalogConfig, Error, RegionRecord, Result};
use tracing::debug;

/// Structural checks applied to heartbeats and query keys before they reach
/// the catalog
#[derive(Debug, Clone)]
pub struct HeartbeatValidator {
    /// Maximum start/end key length in bytes
    max_key_len: usize,
}

impl Default for HeartbeatValidator {
    fn default() -> Self {
        Self::new(&CatalogConfig::default())
    }
}

impl HeartbeatValidator {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            max_key_len: config.max_key_len,
        }
    }

    /// Validate a decoded region report
    pub fn validate_region(&self, region: &RegionRecord) -> Result<()> {
        if region.id == 0 {
            return Err(Error::InvalidRegion {
                region_id: 0,
                reason: "region id must be non-zero".to_string(),
            });
        }

        if region.peers.is_empty() {
            return Err(Error::InvalidRegion {
                region_id: region.id,
                reason: "region has no peers".to_string(),
            });
        }

        self.validate_key(&region.start_key)?;
        self.validate_key(&region.end_key)?;

        region.validate()
    }

    /// Validate a raw key length
    pub fn validate_key(&self, key: &[u8]) -> Result<()> {
        if key.len() > self.max_key_len {
            return Err(Error::InvalidKey {
                message: format!(
                    "key of {} bytes exceeds maximum length of {} bytes",
                    key.len(),
                    self.max_key_len
                ),
            });
        }
        Ok(())
    }

    /// Decode a hex-encoded key taken from a path or query string
    pub fn decode_key(&self, encoded: &str) -> Result<Vec<u8>> {
        let key = hex::decode(encoded).map_err(|e| Error::InvalidKey {
            message: format!("'{}' is not valid hex: {}", encoded, e),
        })?;
        self.validate_key(&key)?;
        Ok(key)
    }
}

/// Per-route request counters and latency samples
pub struct RequestMetrics {
    /// Total requests by route
    requests: DashMap<String, AtomicU64>,
    /// Error responses by route
    errors: DashMap<String, AtomicU64>,
    /// Recent latencies by route, in microseconds
    latencies: DashMap<String, Mutex<VecDeque<u64>>>,
    /// Max latency samples to keep per route
    max_samples: usize,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::with_max_samples(1000)
    }

    pub fn with_max_samples(max_samples: usize) -> Self {
        Self {
            requests: DashMap::new(),
            errors: DashMap::new(),
            latencies: DashMap::new(),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record_request(&self, route: &str) {
        self.requests
            .entry(route.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, route: &str) {
        self.errors
            .entry(route.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, route: &str, latency_us: u64) {
        let entry = self
            .latencies
            .entry(route.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::with_capacity(self.max_samples)));
        let mut samples = entry.lock();
        if samples.len() >= self.max_samples {
            samples.pop_front();
        }
        samples.push_back(latency_us);
    }

    pub fn request_count(&self, route: &str) -> u64 {
        self.requests
            .get(route)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn error_count(&self, route: &str) -> u64 {
        self.errors
            .get(route)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// p99 latency for a route in microseconds
    pub fn p99_latency(&self, route: &str) -> Option<u64> {
        let entry = self.latencies.get(route)?;
        let mut sorted: Vec<u64> = entry.lock().iter().copied().collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted.get(idx.min(sorted.len() - 1)).copied()
    }

    /// route -> (requests, errors, p99 latency)
    pub fn summary(&self) -> HashMap<String, (u64, u64, Option<u64>)> {
        let mut result = HashMap::new();

        for entry in self.requests.iter() {
            let route = entry.key().clone();
            let requests = entry.value().load(Ordering::Relaxed);
            let errors = self.error_count(&route);
            let p99 = self.p99_latency(&route);
            result.insert(route, (requests, errors, p99));
        }

        result
    }
}

/// Record count, latency and error status of every routed request
pub async fn track_requests(
    State(metrics): State<Arc<RequestMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| format!("{} {}", request.method(), p.as_str()))
        .unwrap_or_else(|| format!("{} <unmatched>", request.method()));

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_us = started.elapsed().as_micros() as u64;

    metrics.record_request(&route);
    metrics.record_latency(&route, latency_us);
    if response.status().is_client_error() || response.status().is_server_error() {
        metrics.record_error(&route);
    }

    debug!(
        route = %route,
        status = response.status().as_u16(),
        latency_us = latency_us,
        "Request completed"
    );
    response
}
