//! Sampled logging for hot-path errors
//!
//! Prevents log spam when a downstream is down or a client sends garbage:
//! each error site owns a `LogSampler`, counts every event, and logs at most
//! once per interval with the number of events suppressed since the last
//! line.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use relay_metrics::LogSampler;
//!
//! let sampler = LogSampler::new(Duration::from_secs(1));
//! for _ in 0..1000 {
//!     if let Some(suppressed) = sampler.sample() {
//!         tracing::warn!(suppressed, "dropping unparsable record");
//!     }
//! }
//! assert_eq!(sampler.total(), 1000);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between sampled log lines
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Rate limiter for one log site
///
/// Thread-safe: counters are atomics, the last log time sits behind a mutex
/// that is only taken after the pending count is bumped.
#[derive(Debug)]
pub struct LogSampler {
    interval: Duration,
    last_logged: Mutex<Option<Instant>>,
    /// Events since the last emitted line
    pending: AtomicU64,
    total: AtomicU64,
}

impl LogSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_logged: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Count one event
    ///
    /// Returns `Some(suppressed)` when the caller should log now, where
    /// `suppressed` is the number of events swallowed since the previous
    /// line. Returns `None` otherwise.
    pub fn sample(&self) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let now = Instant::now();
        {
            let mut last = self.last_logged.lock();
            match *last {
                Some(at) if now.duration_since(at) < self.interval => return None,
                _ => *last = Some(now),
            }
        }

        let count = self.pending.swap(0, Ordering::Relaxed);
        Some(count.saturating_sub(1))
    }

    /// Events not yet reported in a log line
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// All events ever counted
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for LogSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}
