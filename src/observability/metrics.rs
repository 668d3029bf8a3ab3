//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count requests per endpoint and errors
//! - Bucket request latencies into a fixed-edge histogram
//! - Estimate p95/p99 from the buckets for the `/metrics` endpoint
//! - Mirror request counts/latency into the `metrics` facade for Prometheus
//!
//! # Metrics (facade)
//! - `epiphany_requests_total` (counter): completed requests by method, status
//! - `epiphany_request_duration_seconds` (histogram): request latency
//!
//! # Design Decisions
//! - One `MetricsRegistry` value per process, shared via `Arc`
//! - All updates are relaxed atomic operations; no locks on the request path
//! - Percentiles are bucket-edge approximations, good for dashboards only

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;

/// Upper edge used for the overflow bucket.
pub const OVERFLOW_EDGE_MS: u64 = 1 << 60;

/// Inclusive upper edges of the latency histogram, in milliseconds.
pub const BUCKET_EDGES_MS: [u64; 10] = [1, 5, 10, 50, 100, 200, 500, 1000, 2000, OVERFLOW_EDGE_MS];

/// Endpoints with a dedicated counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    SearchV2,
    Health,
}

/// Process-wide request counters and latency histogram.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests: AtomicU64,
    api_search: AtomicU64,
    api_search_v2: AtomicU64,
    health: AtomicU64,
    errors: AtomicU64,
    last_latency_ms: AtomicU64,
    total_latency_ms: AtomicU64,
    buckets: [AtomicU64; 10],
}

/// Point-in-time view of the registry, serialized by `/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub api_search: u64,
    pub api_search_v2: u64,
    pub health: u64,
    pub errors: u64,
    pub last_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub latency_buckets: Vec<BucketCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub le: u64,
    pub count: u64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a hit on an endpoint with a dedicated counter.
    pub fn record_endpoint(&self, endpoint: Endpoint) {
        let counter = match endpoint {
            Endpoint::Search => &self.api_search,
            Endpoint::SearchV2 => &self.api_search_v2,
            Endpoint::Health => &self.health,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Store the latest latency, accumulate the total, and increment the
    /// first bucket whose edge is >= `ms`.
    pub fn record_latency(&self, ms: u64) {
        self.last_latency_ms.store(ms, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(ms, Ordering::Relaxed);
        self.buckets[bucket_index(ms)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let counts: Vec<u64> = self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect();
        let avg_latency_ms = match requests {
            0 => 0,
            n => self.total_latency_ms.load(Ordering::Relaxed) / n,
        };

        MetricsSnapshot {
            requests,
            api_search: self.api_search.load(Ordering::Relaxed),
            api_search_v2: self.api_search_v2.load(Ordering::Relaxed),
            health: self.health.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_latency_ms: self.last_latency_ms.load(Ordering::Relaxed),
            avg_latency_ms,
            p95_ms: percentile(&counts, 0.95),
            p99_ms: percentile(&counts, 0.99),
            latency_buckets: BUCKET_EDGES_MS
                .iter()
                .zip(&counts)
                .map(|(&le, &count)| BucketCount { le, count })
                .collect(),
        }
    }

    pub fn snapshot_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}

/// Index of the first bucket whose edge is >= `ms`.
fn bucket_index(ms: u64) -> usize {
    BUCKET_EDGES_MS
        .iter()
        .position(|&edge| ms <= edge)
        .unwrap_or(BUCKET_EDGES_MS.len() - 1)
}

/// Edge of the first bucket where the cumulative count reaches
/// `ceil(p * total)`. Returns 0 for an empty histogram.
pub fn percentile(counts: &[u64], p: f64) -> u64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }
    let target = ((p * total as f64).ceil() as u64).max(1);
    let mut acc = 0;
    for (count, &edge) in counts.iter().zip(BUCKET_EDGES_MS.iter()) {
        acc += count;
        if acc >= target {
            return edge;
        }
    }
    OVERFLOW_EDGE_MS
}

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record a completed request in the metrics facade.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "epiphany_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!("epiphany_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
