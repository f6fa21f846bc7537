//! Worker pool metrics
//!
//! Atomic counters shared by every worker. All operations use relaxed
//! ordering; values are eventually consistent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use relay_metrics::{PipelineMetricsProvider, PipelineSnapshot};
use relay_sinks::Delivery;

/// Counters for the worker pool
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Lines taken off the main queue
    lines_processed: AtomicU64,

    /// Lines that failed to parse
    error_recs: AtomicU64,

    /// Records with a fractional timestamp
    special_recs: AtomicU64,

    /// Records no rule matched
    unrouted_recs: AtomicU64,

    /// Records sent to a blackhole cluster
    blackholed_recs: AtomicU64,

    /// Host enqueues that found the queue full
    throttled_host: AtomicU64,

    /// Host enqueues that succeeded
    routed_recs: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            lines_processed: AtomicU64::new(0),
            error_recs: AtomicU64::new(0),
            special_recs: AtomicU64::new(0),
            unrouted_recs: AtomicU64::new(0),
            blackholed_recs: AtomicU64::new(0),
            throttled_host: AtomicU64::new(0),
            routed_recs: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_parse_error(&self) {
        self.error_recs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_special(&self) {
        self.special_recs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unrouted(&self) {
        self.unrouted_recs.fetch_add(1, Ordering::Relaxed);
    }

    /// Add the outcome of routing one record to every target cluster
    #[inline]
    pub fn record_delivery(&self, delivery: &Totals) {
        if delivery.queued > 0 {
            self.routed_recs.fetch_add(delivery.queued, Ordering::Relaxed);
        }
        if delivery.throttled > 0 {
            self.throttled_host
                .fetch_add(delivery.throttled, Ordering::Relaxed);
        }
        if delivery.blackholed > 0 {
            self.blackholed_recs
                .fetch_add(delivery.blackholed, Ordering::Relaxed);
        }
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            lines_processed: self.lines_processed.load(Ordering::Relaxed),
            error_recs: self.error_recs.load(Ordering::Relaxed),
            special_recs: self.special_recs.load(Ordering::Relaxed),
            unrouted_recs: self.unrouted_recs.load(Ordering::Relaxed),
            blackholed_recs: self.blackholed_recs.load(Ordering::Relaxed),
            throttled_host: self.throttled_host.load(Ordering::Relaxed),
            routed_recs: self.routed_recs.load(Ordering::Relaxed),
        }
    }
}

/// Per-record sum of [`Delivery`] results across clusters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub queued: u64,
    pub throttled: u64,
    pub blackholed: u64,
}

impl Totals {
    #[inline]
    pub fn add(&mut self, delivery: Delivery) {
        self.queued += delivery.queued as u64;
        self.throttled += delivery.throttled as u64;
        self.blackholed += u64::from(delivery.blackholed);
    }
}

/// Handle for reading pool metrics externally
///
/// Stays valid after the pool is consumed by `spawn()`.
#[derive(Debug, Clone)]
pub struct PipelineMetricsHandle {
    pub(crate) metrics: Arc<PipelineMetrics>,
}

impl PipelineMetricsProvider for PipelineMetricsHandle {
    fn pipeline_snapshot(&self) -> PipelineSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_accumulate() {
        let mut totals = Totals::default();
        totals.add(Delivery {
            queued: 2,
            throttled: 1,
            blackholed: false,
        });
        totals.add(Delivery {
            blackholed: true,
            ..Delivery::default()
        });

        assert_eq!(
            totals,
            Totals {
                queued: 2,
                throttled: 1,
                blackholed: 1
            }
        );
    }

    #[test]
    fn test_snapshot() {
        let metrics = PipelineMetrics::new();
        metrics.record_line();
        metrics.record_line();
        metrics.record_parse_error();
        metrics.record_special();
        metrics.record_unrouted();
        metrics.record_delivery(&Totals {
            queued: 3,
            throttled: 2,
            blackholed: 1,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lines_processed, 2);
        assert_eq!(snapshot.error_recs, 1);
        assert_eq!(snapshot.special_recs, 1);
        assert_eq!(snapshot.unrouted_recs, 1);
        assert_eq!(snapshot.routed_recs, 3);
        assert_eq!(snapshot.throttled_host, 2);
        assert_eq!(snapshot.blackholed_recs, 1);
    }
}
