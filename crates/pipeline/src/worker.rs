//! Worker pool - parse, rewrite and route lines off the main queue
//!
//! Every worker runs the same loop over the shared main queue receiver:
//!
//! ```text
//! Payload ─→ parse ─→ rewrite (0..n copies) ─→ rules.route ─→ ClusterSet::push
//! ```
//!
//! Workers share only immutable state (rules, rewriter, clusters) and
//! atomics. The pool owns the [`ClusterSet`]; once the last worker exits the
//! set is dropped, which closes every host queue and lets the host streamers
//! drain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossfire::MAsyncRx;
use relay_config::{GlobalConfig, LogConfig};
use relay_metrics::{DEFAULT_SAMPLE_INTERVAL, LogSampler};
use relay_protocol::{Bytes, Payload, Record};
use relay_routing::Rules;
use relay_sinks::ClusterSet;
use relay_transform::Rewriter;
use tokio::task::JoinHandle;

use crate::metrics::{PipelineMetrics, PipelineMetricsHandle, Totals};

/// Worker pool settings
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Number of worker tasks
    pub workers: usize,

    /// Normalize paths while parsing
    pub normalize: bool,

    /// Log records with fractional timestamps (sampled)
    pub log_special_records: bool,

    /// Minimum gap between two sampled log lines of one kind
    pub sample_interval: Duration,
}

impl WorkerOptions {
    pub fn from_config(global: &GlobalConfig, log: &LogConfig) -> Self {
        Self {
            workers: global.workers.max(1),
            normalize: global.normalize_records,
            log_special_records: global.log_special_records,
            sample_interval: log.error_sample_interval,
        }
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            normalize: true,
            log_special_records: true,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Fixed-size pool draining the main queue
///
/// # Example
///
/// ```ignore
/// let (tx, rx) = crossfire::mpmc::bounded_async::<Payload>(10_000);
/// let pool = WorkerPool::new(rules, rewriter, clusters, WorkerOptions::default());
/// let metrics = pool.metrics_handle();
///
/// let workers = pool.spawn(rx);
/// // listeners push into `tx`; dropping every sender ends the workers
/// ```
pub struct WorkerPool {
    rules: Rules,
    rewriter: Rewriter,
    clusters: ClusterSet,
    options: WorkerOptions,
    metrics: Arc<PipelineMetrics>,
    parse_errors: LogSampler,
    special_records: LogSampler,
}

impl WorkerPool {
    pub fn new(rules: Rules, rewriter: Rewriter, clusters: ClusterSet, options: WorkerOptions) -> Self {
        Self {
            rules,
            rewriter,
            clusters,
            parse_errors: LogSampler::new(options.sample_interval),
            special_records: LogSampler::new(options.sample_interval),
            options,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle remains valid after `spawn()` consumes the pool.
    pub fn metrics_handle(&self) -> PipelineMetricsHandle {
        PipelineMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Process every line of one main-queue item
    ///
    /// `scratch` is reused between calls to hold rewrite output.
    pub fn process(&self, payload: &Payload, scratch: &mut Vec<Record>) {
        for line in payload.lines() {
            self.process_line(line, scratch);
        }
    }

    /// Parse, rewrite and route one line
    pub fn process_line(&self, line: &Bytes, scratch: &mut Vec<Record>) {
        self.metrics.record_line();

        let record = match Record::parse(line, self.options.normalize, Instant::now()) {
            Ok(record) => record,
            Err(e) => {
                self.metrics.record_parse_error();
                if let Some(suppressed) = self.parse_errors.sample() {
                    tracing::info!(
                        error = %e,
                        kind = e.kind(),
                        line = %String::from_utf8_lossy(line),
                        suppressed,
                        "dropping unparsable record"
                    );
                }
                return;
            }
        };

        if record.has_fractional_time() {
            self.metrics.record_special();
            if self.options.log_special_records
                && let Some(suppressed) = self.special_records.sample()
            {
                tracing::info!(
                    path = record.path(),
                    timestamp = %String::from_utf8_lossy(record.raw_time()),
                    suppressed,
                    "record with fractional timestamp"
                );
            }
        }

        scratch.clear();
        self.rewriter.apply_into(record, scratch);
        for record in scratch.drain(..) {
            self.route(Arc::new(record));
        }
    }

    fn route(&self, record: Arc<Record>) {
        let mut totals = Totals::default();
        let targets = self
            .rules
            .route(record.path(), |id| totals.add(self.clusters.push(id, &record)));

        if targets == 0 {
            self.metrics.record_unrouted();
        } else {
            self.metrics.record_delivery(&totals);
        }
    }

    /// Spawn the workers; each one exits once the main queue is closed and
    /// empty
    ///
    /// The returned handles complete in any order. The cluster set (and with
    /// it every host queue sender) is released when the last worker exits.
    pub fn spawn(self, receiver: MAsyncRx<Payload>) -> Vec<JoinHandle<()>> {
        let workers = self.options.workers.max(1);

        tracing::info!(
            workers,
            rules = self.rules.len(),
            rewrites = self.rewriter.len(),
            clusters = self.clusters.len(),
            normalize = self.options.normalize,
            "worker pool starting"
        );

        let pool = Arc::new(self);
        (0..workers)
            .map(|worker_id| {
                let pool = Arc::clone(&pool);
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker_id, "worker starting");

                    let mut scratch = Vec::new();
                    while let Ok(payload) = receiver.recv().await {
                        pool.process(&payload, &mut scratch);
                    }

                    tracing::debug!(worker_id, "worker stopping");
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.options.workers)
            .field("rules", &self.rules.len())
            .field("rewrites", &self.rewriter.len())
            .field("clusters", &self.clusters.len())
            .finish()
    }
}
