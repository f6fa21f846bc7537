//! Relay - Metrics
//!
//! Internal metrics collection and reporting.
//!
//! # Overview
//!
//! This crate provides:
//! - Atomic counters for listeners and provider traits for every component
//! - A per-host processing latency histogram
//! - A periodic reporter with human or JSON output
//! - `LogSampler` for rate-limited logging of hot-path errors
//!
//! # Metrics Handle Pattern
//!
//! Components use `Arc<Metrics>` internally and provide a `metrics_handle()`
//! method that returns a lightweight handle implementing the matching
//! provider trait. The handle remains valid after `run()` consumes the
//! component.
//!
//! ```text
//! Component (owns Arc<Metrics>)
//!     │
//!     ├──► metrics_handle() → Handle (clones Arc, implements Provider trait)
//!     │
//!     └──► run() [consumes self, Arc keeps metrics alive]
//! ```
//!
//! # Metric Categories
//!
//! - **Listeners**: active_connections, in_recs, throttled_recs, errors
//! - **Workers**: error_recs, special_recs, unrouted_recs, blackholed_recs, throttled_host
//! - **Hosts**: out_recs, state changes, reconnects, write/flush errors, latency

mod collected;
pub mod format;
mod histogram;
mod reporter;
mod sampler;
mod traits;

pub use collected::{
    CollectedHost, CollectedMetrics, CollectedSource, HostRates, MetricsRates, PipelineRates,
    SourceRates,
};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use histogram::{LatencyHistogram, LatencySummary};
pub use reporter::{Reporter, ReporterBuilder};
pub use sampler::{DEFAULT_SAMPLE_INTERVAL, LogSampler};
pub use traits::{
    HostMetricsProvider, HostMetricsSnapshot, PipelineMetricsProvider, PipelineSnapshot,
    SourceMetrics, SourceMetricsProvider, SourceMetricsSnapshot,
};

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Create a new counter initialized to 0
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val` (relaxed ordering for performance)
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Increment the counter by 1
    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    /// Get the current value (relaxed ordering)
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
