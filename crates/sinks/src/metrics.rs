//! Per-host counters
//!
//! Every sub-connection of a host updates the same `HostMetrics`. The
//! reporter reads them through a [`HostMetricsHandle`].

use std::sync::Arc;
use std::time::Duration;

use relay_metrics::{
    Counter, HostMetricsProvider, HostMetricsSnapshot, LatencyHistogram,
};

use crate::host::HostShared;

/// Counters for one downstream host
#[derive(Debug, Default)]
pub struct HostMetrics {
    out_recs: Counter,
    throttled: Counter,
    state_changes: Counter,
    reconnects: Counter,
    dial_errors: Counter,
    old_connection_refresh: Counter,
    write_errors: Counter,
    flush_errors: Counter,
    latency: LatencyHistogram,
}

impl HostMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a record written to the wire, `elapsed` after it was parsed
    #[inline]
    pub fn record_out(&self, elapsed: Duration) {
        self.out_recs.inc();
        self.latency.record(elapsed);
    }

    #[inline]
    pub fn record_throttled(&self) {
        self.throttled.inc();
    }

    #[inline]
    pub fn record_state_change(&self) {
        self.state_changes.inc();
    }

    #[inline]
    pub fn record_reconnect(&self) {
        self.reconnects.inc();
    }

    #[inline]
    pub fn record_dial_error(&self) {
        self.dial_errors.inc();
    }

    #[inline]
    pub fn record_refresh(&self) {
        self.old_connection_refresh.inc();
    }

    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.inc();
    }

    #[inline]
    pub fn record_flush_error(&self) {
        self.flush_errors.inc();
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self, available: bool) -> HostMetricsSnapshot {
        HostMetricsSnapshot {
            out_recs: self.out_recs.get(),
            throttled_host: self.throttled.get(),
            state_changes: self.state_changes.get(),
            reconnects: self.reconnects.get(),
            dial_errors: self.dial_errors.get(),
            old_connection_refresh: self.old_connection_refresh.get(),
            write_errors: self.write_errors.get(),
            flush_errors: self.flush_errors.get(),
            available,
            latency: self.latency.summary(),
        }
    }
}

/// Handle for accessing host metrics
///
/// Holds an Arc to the host state, so it remains valid after the cluster
/// set is dropped during shutdown.
#[derive(Clone)]
pub struct HostMetricsHandle {
    pub(crate) shared: Arc<HostShared>,
}

impl HostMetricsProvider for HostMetricsHandle {
    fn host_id(&self) -> &str {
        self.shared.id()
    }

    fn cluster(&self) -> &str {
        self.shared.cluster()
    }

    fn snapshot(&self) -> HostMetricsSnapshot {
        self.shared.metrics().snapshot(self.shared.is_available())
    }
}
