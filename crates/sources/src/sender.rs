//! Main queue producer side
//!
//! Every listener pushes through a [`MainSender`]. Sends never wait: when the
//! queue is full the lines are dropped and counted as `throttled_recs` on
//! the listener's metrics.
//!
//! The queue closes once the last clone is dropped, which is how workers
//! learn that ingress is done during shutdown.

use std::sync::Arc;

use crossfire::{MAsyncTx, TrySendError};
use relay_metrics::SourceMetrics;
use relay_protocol::Payload;

/// Outcome of one push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Queued,
    /// Queue full; the payload was dropped
    Throttled,
    /// Queue closed; the relay is shutting down
    Closed,
}

/// Cloneable handle onto the main queue
#[derive(Clone)]
pub struct MainSender {
    tx: MAsyncTx<Payload>,
}

impl MainSender {
    pub fn new(tx: MAsyncTx<Payload>) -> Self {
        Self { tx }
    }

    /// Push without waiting, updating `metrics`
    #[inline]
    pub fn push(&self, payload: Payload, metrics: &SourceMetrics) -> Push {
        let lines = payload.line_count() as u64;
        match self.tx.try_send(payload) {
            Ok(()) => {
                metrics.record_in(lines);
                Push::Queued
            }
            Err(TrySendError::Full(_)) => {
                metrics.record_throttled(lines);
                Push::Throttled
            }
            Err(TrySendError::Disconnected(_)) => Push::Closed,
        }
    }
}

impl std::fmt::Debug for MainSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainSender").finish_non_exhaustive()
    }
}

/// Metrics handle shared by all listener types
///
/// Implements `SourceMetricsProvider`; it holds an Arc to the counters, so it
/// remains valid after the listener is consumed by `run()`.
#[derive(Clone)]
pub struct ListenerMetricsHandle {
    pub(crate) id: String,
    pub(crate) source_type: &'static str,
    pub(crate) metrics: Arc<SourceMetrics>,
}

impl relay_metrics::SourceMetricsProvider for ListenerMetricsHandle {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> &str {
        self.source_type
    }

    fn snapshot(&self) -> relay_metrics::SourceMetricsSnapshot {
        self.metrics.snapshot()
    }
}
