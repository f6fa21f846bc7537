//! Collected metrics snapshot and rate calculations
//!
//! This module contains the snapshot of every component at one point in
//! time, plus rate calculation for per-second throughput between two
//! collections.

use std::time::{Duration, Instant};

use crate::{HostMetricsSnapshot, PipelineSnapshot, SourceMetricsSnapshot};

/// Collected listener snapshot with metadata
#[derive(Debug, Clone)]
pub struct CollectedSource {
    /// Listener identifier
    pub id: String,
    /// Listener type (tcp, udp, grpc, ...)
    pub source_type: String,
    pub snapshot: SourceMetricsSnapshot,
}

/// Collected host snapshot with metadata
#[derive(Debug, Clone)]
pub struct CollectedHost {
    /// Host identifier (`name:port`)
    pub id: String,
    /// Owning cluster
    pub cluster: String,
    pub snapshot: HostMetricsSnapshot,
}

/// Complete metrics collection at a point in time
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    /// When this collection was taken
    pub timestamp: Option<Instant>,

    /// Worker pool counters
    pub pipeline: Option<PipelineSnapshot>,

    /// All listener metrics
    pub sources: Vec<CollectedSource>,

    /// All host metrics
    pub hosts: Vec<CollectedHost>,
}

impl CollectedMetrics {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self {
            timestamp: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Total records received across all listeners
    pub fn total_in(&self) -> u64 {
        self.sources.iter().map(|s| s.snapshot.in_recs).sum()
    }

    /// Total records dropped on a full main queue
    pub fn total_throttled(&self) -> u64 {
        self.sources.iter().map(|s| s.snapshot.throttled_recs).sum()
    }

    /// Total records written by all hosts
    pub fn total_out(&self) -> u64 {
        self.hosts.iter().map(|h| h.snapshot.out_recs).sum()
    }

    /// Calculate rates by comparing with a previous snapshot
    ///
    /// Returns None if there's no previous snapshot or timestamps are missing.
    pub fn rates(&self, previous: &CollectedMetrics) -> Option<MetricsRates> {
        let current_ts = self.timestamp?;
        let previous_ts = previous.timestamp?;

        let elapsed = current_ts.duration_since(previous_ts);
        if elapsed.is_zero() {
            return None;
        }

        let elapsed_secs = elapsed.as_secs_f64();

        let pipeline = match (&self.pipeline, &previous.pipeline) {
            (Some(current), Some(prev)) => Some(PipelineRates {
                lines_per_sec: rate(current.lines_processed, prev.lines_processed, elapsed_secs),
                routed_per_sec: rate(current.routed_recs, prev.routed_recs, elapsed_secs),
                errors: current.error_recs.saturating_sub(prev.error_recs),
                unrouted: current.unrouted_recs.saturating_sub(prev.unrouted_recs),
                throttled_host: current.throttled_host.saturating_sub(prev.throttled_host),
            }),
            _ => None,
        };

        // Match by id; components registered between collections are skipped
        let sources = self
            .sources
            .iter()
            .filter_map(|current| {
                let prev = previous.sources.iter().find(|s| s.id == current.id)?;
                Some(SourceRates {
                    id: current.id.clone(),
                    source_type: current.source_type.clone(),
                    recs_per_sec: rate(current.snapshot.in_recs, prev.snapshot.in_recs, elapsed_secs),
                    bytes_per_sec: rate(
                        current.snapshot.bytes_received,
                        prev.snapshot.bytes_received,
                        elapsed_secs,
                    ),
                    active_connections: current.snapshot.active_connections,
                    throttled: current
                        .snapshot
                        .throttled_recs
                        .saturating_sub(prev.snapshot.throttled_recs),
                    errors: current.snapshot.errors.saturating_sub(prev.snapshot.errors),
                })
            })
            .collect();

        let hosts = self
            .hosts
            .iter()
            .filter_map(|current| {
                let prev = previous.hosts.iter().find(|h| h.id == current.id)?;
                Some(HostRates {
                    id: current.id.clone(),
                    cluster: current.cluster.clone(),
                    recs_per_sec: rate(current.snapshot.out_recs, prev.snapshot.out_recs, elapsed_secs),
                    available: current.snapshot.available,
                    throttled: current
                        .snapshot
                        .throttled_host
                        .saturating_sub(prev.snapshot.throttled_host),
                    errors: (current.snapshot.write_errors + current.snapshot.flush_errors)
                        .saturating_sub(prev.snapshot.write_errors + prev.snapshot.flush_errors),
                    p99_us: current.snapshot.latency.p99_us,
                })
            })
            .collect();

        Some(MetricsRates {
            elapsed,
            pipeline,
            sources,
            hosts,
        })
    }
}

/// Calculate rate per second
#[inline]
fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    let delta = current.saturating_sub(previous);
    delta as f64 / elapsed_secs
}

/// Calculated rates between two snapshots
#[derive(Debug, Clone)]
pub struct MetricsRates {
    /// Time elapsed between snapshots
    pub elapsed: Duration,
    pub pipeline: Option<PipelineRates>,
    pub sources: Vec<SourceRates>,
    pub hosts: Vec<HostRates>,
}

/// Worker pool rates
#[derive(Debug, Clone, Copy)]
pub struct PipelineRates {
    pub lines_per_sec: f64,
    pub routed_per_sec: f64,
    /// Parse errors in this period
    pub errors: u64,
    /// Unrouted records in this period
    pub unrouted: u64,
    /// Host queue drops in this period
    pub throttled_host: u64,
}

/// Listener rates
#[derive(Debug, Clone)]
pub struct SourceRates {
    pub id: String,
    pub source_type: String,
    pub recs_per_sec: f64,
    pub bytes_per_sec: f64,
    pub active_connections: u64,
    /// Main queue drops in this period
    pub throttled: u64,
    pub errors: u64,
}

/// Host rates
#[derive(Debug, Clone)]
pub struct HostRates {
    pub id: String,
    pub cluster: String,
    pub recs_per_sec: f64,
    pub available: bool,
    /// Host queue drops in this period
    pub throttled: u64,
    /// Write and flush errors in this period
    pub errors: u64,
    /// Lifetime p99 processing latency
    pub p99_us: u64,
}
