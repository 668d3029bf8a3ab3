//! Query service: runs searches and renders the two response shapes.
//!
//! The annotated (v2) shape times the search and aggregate phases separately
//! so operators can see which store call dominates. Timings are whole
//! milliseconds; a phase that did not run reports 0, and
//! `elapsed_ms == search_ms + aggregate_ms`.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::search::searcher::Searcher;
use crate::storage::{Item, PriceAggregates};

/// Body of `/api/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub items: Vec<Item>,
    pub total: u64,
    pub latency_ms: f64,
}

/// Body of `/api/search_v2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchV2Response {
    pub trace_id: String,
    pub limit: i64,
    pub offset: i64,
    pub total: u64,
    pub elapsed_ms: u64,
    pub parse_ms: u64,
    pub route_ms: u64,
    pub search_ms: u64,
    pub aggregate_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregates: Option<Aggregates>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregates {
    pub price: PriceAggregates,
}

#[derive(Clone)]
pub struct QueryService {
    searcher: Searcher,
    aggregates_enabled: bool,
}

impl QueryService {
    pub fn new(searcher: Searcher, aggregates_enabled: bool) -> Self {
        Self {
            searcher,
            aggregates_enabled,
        }
    }

    pub fn search(&self, q: &str, limit: i64, offset: i64) -> SearchResponse {
        let start = Instant::now();
        let result = self.searcher.search(q, limit, offset);
        SearchResponse {
            items: result.items,
            total: result.total,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }

    /// `limit` and `offset` are echoed as requested; clamping happens in the
    /// store.
    pub fn search_v2(&self, q: &str, limit: i64, offset: i64) -> SearchV2Response {
        let trace_id = generate_trace_id();

        let start = Instant::now();
        let result = self.searcher.search(q, limit, offset);
        let search_ms = whole_ms(start.elapsed());

        let (aggregates, aggregate_ms) = if self.aggregates_enabled {
            let start = Instant::now();
            let price = self.searcher.aggregates(q);
            (Some(Aggregates { price }), whole_ms(start.elapsed()))
        } else {
            (None, 0)
        };

        tracing::debug!(
            trace_id = %trace_id,
            query = %q,
            total = result.total,
            search_ms,
            aggregate_ms,
            "search_v2 completed"
        );

        SearchV2Response {
            trace_id,
            limit,
            offset,
            total: result.total,
            elapsed_ms: search_ms + aggregate_ms,
            parse_ms: 0,
            route_ms: 0,
            search_ms,
            aggregate_ms,
            aggregates,
            items: result.items,
        }
    }
}

fn whole_ms(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Random 64-bit hex token for correlating a v2 response.
pub fn generate_trace_id() -> String {
    format!("{:016x}", fastrand::u64(..))
}
