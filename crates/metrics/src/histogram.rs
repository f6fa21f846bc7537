//! Processing latency histogram
//!
//! Each host records the time from parse to write for every record it
//! delivers. Values are microseconds in an HDR histogram with three
//! significant digits; anything above one hour saturates.

use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

/// Highest trackable value, one hour in microseconds
const MAX_MICROS: u64 = 3_600 * 1_000_000;

/// Thread-safe latency histogram
///
/// The lock is held for a single `saturating_record` on the write path, and
/// for one percentile pass when the reporter collects.
#[derive(Debug)]
pub struct LatencyHistogram {
    inner: Mutex<Histogram<u64>>,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_MICROS, 3)
            .expect("static histogram bounds are valid");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    /// Record one observation
    #[inline]
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.inner.lock().saturating_record(micros.max(1));
    }

    /// Summarize everything recorded so far
    pub fn summary(&self) -> LatencySummary {
        let histogram = self.inner.lock();
        if histogram.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            count: histogram.len(),
            p50_us: histogram.value_at_quantile(0.50),
            p90_us: histogram.value_at_quantile(0.90),
            p99_us: histogram.value_at_quantile(0.99),
            max_us: histogram.max(),
        }
    }

    /// Drop all observations
    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

/// Percentiles of a latency histogram, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let histogram = LatencyHistogram::new();
        assert_eq!(histogram.summary(), LatencySummary::default());
    }

    #[test]
    fn test_percentiles() {
        let histogram = LatencyHistogram::new();
        for ms in 1..=100 {
            histogram.record(Duration::from_millis(ms));
        }

        let summary = histogram.summary();
        assert_eq!(summary.count, 100);
        // three significant digits
        assert!((49_900..=50_100).contains(&summary.p50_us), "{summary:?}");
        assert!((98_900..=99_100).contains(&summary.p99_us), "{summary:?}");
        assert!((99_900..=100_100).contains(&summary.max_us), "{summary:?}");
    }

    #[test]
    fn test_zero_and_huge_values_saturate() {
        let histogram = LatencyHistogram::new();
        histogram.record(Duration::ZERO);
        histogram.record(Duration::from_secs(86_400));

        let summary = histogram.summary();
        assert_eq!(summary.count, 2);
        assert!(summary.max_us <= MAX_MICROS + MAX_MICROS / 1000);
    }

    #[test]
    fn test_reset() {
        let histogram = LatencyHistogram::new();
        histogram.record(Duration::from_millis(5));
        histogram.reset();
        assert_eq!(histogram.summary().count, 0);
    }
}
