//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection loop (per completed request):
//!     → metrics.rs (MetricsRegistry counters + latency histogram)
//!     → metrics.rs (metrics facade → optional Prometheus exporter)
//!     → logging.rs (structured log events, one span per connection)
//!
//! Consumers:
//!     → GET /metrics (JSON snapshot of the registry)
//!     → Prometheus scrape (when enabled)
//!     → stdout (pretty or JSON logs)
//! ```
//!
//! # Design Decisions
//! - Registry is an explicit value created at startup, not a global
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use metrics::{Endpoint, MetricsRegistry, MetricsSnapshot};
