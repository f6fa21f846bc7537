//! Metrics provider traits
//!
//! Traits for components to expose their metrics to the reporter.
//! Listeners, the worker pool and host senders implement these traits so the
//! reporter can collect their metrics without knowing the concrete types.
//!
//! # Design
//!
//! - Traits use `&self` for zero-copy metric access
//! - All providers are `Send + Sync` for thread-safe collection
//! - Metric structs use atomics internally, so no locks needed

use std::sync::atomic::{AtomicU64, Ordering};

use crate::LatencySummary;

/// Metrics for an ingress listener
///
/// All fields use atomics for lock-free updates.
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Currently open connections
    pub active_connections: AtomicU64,
    /// Connections accepted since start
    pub connections_total: AtomicU64,
    /// Lines handed to the main queue
    pub in_recs: AtomicU64,
    /// Bytes read off the wire
    pub bytes_received: AtomicU64,
    /// Lines dropped because the main queue was full
    pub throttled_recs: AtomicU64,
    /// Lines dropped for exceeding the maximum line length
    pub oversized_recs: AtomicU64,
    /// Read and stream errors
    pub errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            active_connections: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            in_recs: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            throttled_recs: AtomicU64::new(0),
            oversized_recs: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_bytes(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record lines accepted into the main queue
    #[inline]
    pub fn record_in(&self, lines: u64) {
        self.in_recs.fetch_add(lines, Ordering::Relaxed);
    }

    /// Record lines dropped on a full main queue
    #[inline]
    pub fn record_throttled(&self, lines: u64) {
        self.throttled_recs.fetch_add(lines, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_oversized(&self) {
        self.oversized_recs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            in_recs: self.in_recs.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            throttled_recs: self.throttled_recs.load(Ordering::Relaxed),
            oversized_recs: self.oversized_recs.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of listener metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SourceMetricsSnapshot {
    pub active_connections: u64,
    pub connections_total: u64,
    pub in_recs: u64,
    pub bytes_received: u64,
    pub throttled_recs: u64,
    pub oversized_recs: u64,
    pub errors: u64,
}

/// Trait for listeners to provide metrics to the reporter
pub trait SourceMetricsProvider: Send + Sync {
    /// Unique identifier for this listener (usually its bind address)
    fn source_id(&self) -> &str;

    /// Listener type ("tcp", "tcp_batch", "udp", "grpc")
    fn source_type(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SourceMetricsSnapshot;
}

/// Worker pool counters
///
/// Matches the fields of `relay_pipeline::PipelineMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineSnapshot {
    /// Lines taken off the main queue
    pub lines_processed: u64,
    /// Lines that failed to parse
    pub error_recs: u64,
    /// Records with a fractional timestamp
    pub special_recs: u64,
    /// Records no rule matched
    pub unrouted_recs: u64,
    /// Records sent to a blackhole cluster
    pub blackholed_recs: u64,
    /// Records dropped on a full host queue
    pub throttled_host: u64,
    /// Records enqueued to a host
    pub routed_recs: u64,
}

/// Trait for the worker pool to provide metrics to the reporter
pub trait PipelineMetricsProvider: Send + Sync {
    fn pipeline_snapshot(&self) -> PipelineSnapshot;
}

/// Point-in-time snapshot of one downstream host
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct HostMetricsSnapshot {
    /// Records written to the wire
    pub out_recs: u64,
    /// Records dropped on a full host queue
    pub throttled_host: u64,
    /// Available/unavailable transitions
    pub state_changes: u64,
    /// Successful dials
    pub reconnects: u64,
    /// Dial attempts that failed
    pub dial_errors: u64,
    /// Idle connections closed and re-dialed
    pub old_connection_refresh: u64,
    /// Failed or timed out writes
    pub write_errors: u64,
    /// Failed periodic flushes
    pub flush_errors: u64,
    /// Whether the host currently accepts traffic
    pub available: bool,
    /// Time from parse to write
    pub latency: LatencySummary,
}

/// Trait for host senders to provide metrics to the reporter
pub trait HostMetricsProvider: Send + Sync {
    /// Host identifier (`name:port`)
    fn host_id(&self) -> &str;

    /// Owning cluster name
    fn cluster(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> HostMetricsSnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_metrics_snapshot() {
        let metrics = SourceMetrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.record_in(1000);
        metrics.record_bytes(50000);
        metrics.record_throttled(3);
        metrics.record_oversized();
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_connections, 1);
        assert_eq!(snapshot.connections_total, 2);
        assert_eq!(snapshot.in_recs, 1000);
        assert_eq!(snapshot.bytes_received, 50000);
        assert_eq!(snapshot.throttled_recs, 3);
        assert_eq!(snapshot.oversized_recs, 1);
        assert_eq!(snapshot.errors, 1);
    }

    #[test]
    fn test_host_snapshot_default() {
        let snapshot = HostMetricsSnapshot::default();
        assert!(!snapshot.available);
        assert_eq!(snapshot.latency.count, 0);
    }
}
