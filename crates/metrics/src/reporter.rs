//! Periodic metrics reporter
//!
//! Collects metrics from the worker pool, every listener and every host and
//! writes a formatted report via tracing at the configured interval.

use std::sync::Arc;
use std::time::Instant;

use relay_config::{MetricsConfig, MetricsFormat};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::format::MetricsFormatter;
use crate::{
    CollectedHost, CollectedMetrics, CollectedSource, HostMetricsProvider, HumanFormatter,
    JsonFormatter, PipelineMetricsProvider, SourceMetricsProvider,
};

/// Builder for constructing a Reporter
///
/// `Clone` so the binary can build one reporter for the periodic task and
/// keep another for the totals written after shutdown.
#[derive(Default, Clone)]
pub struct ReporterBuilder {
    config: Option<MetricsConfig>,
    pipeline: Option<Arc<dyn PipelineMetricsProvider>>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
    hosts: Vec<Arc<dyn HostMetricsProvider>>,
}

impl ReporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metrics configuration
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the worker pool metrics provider
    pub fn pipeline(mut self, provider: Arc<dyn PipelineMetricsProvider>) -> Self {
        self.pipeline = Some(provider);
        self
    }

    /// Register a listener metrics provider
    pub fn source(mut self, provider: Arc<dyn SourceMetricsProvider>) -> Self {
        self.sources.push(provider);
        self
    }

    /// Register multiple listener metrics providers
    pub fn sources(mut self, providers: Vec<Arc<dyn SourceMetricsProvider>>) -> Self {
        self.sources.extend(providers);
        self
    }

    /// Register a host metrics provider
    pub fn host(mut self, provider: Arc<dyn HostMetricsProvider>) -> Self {
        self.hosts.push(provider);
        self
    }

    /// Register multiple host metrics providers
    pub fn hosts(mut self, providers: Vec<Arc<dyn HostMetricsProvider>>) -> Self {
        self.hosts.extend(providers);
        self
    }

    pub fn build(self) -> Reporter {
        let config = self.config.unwrap_or_default();
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        Reporter {
            config,
            formatter,
            pipeline: self.pipeline,
            sources: self.sources,
            hosts: self.hosts,
            previous: None,
        }
    }
}

/// Metrics reporter
///
/// Collects and reports metrics from all components at a configured interval.
pub struct Reporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    pipeline: Option<Arc<dyn PipelineMetricsProvider>>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
    hosts: Vec<Arc<dyn HostMetricsProvider>>,
    previous: Option<CollectedMetrics>,
}

impl Reporter {
    pub fn builder() -> ReporterBuilder {
        ReporterBuilder::new()
    }

    /// Run the reporter until cancellation
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs(),
            format = ?self.config.format,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Collect and report metrics once
    fn report(&mut self) {
        let metrics = self.collect();
        let rates = self.previous.as_ref().and_then(|prev| metrics.rates(prev));

        let output = self.formatter.format_report(&metrics, rates.as_ref());
        for line in output.lines() {
            info!("{}", line);
        }

        self.previous = Some(metrics);
    }

    /// Write lifetime totals, ignoring the include flags
    pub fn log_totals(&self) {
        let metrics = self.collect_all();
        info!("{}", self.formatter.format_totals(&metrics));
    }

    /// Collect metrics from all registered providers
    pub fn collect(&self) -> CollectedMetrics {
        let mut metrics = self.collect_all();
        if !self.config.include_listeners {
            metrics.sources.clear();
        }
        if !self.config.include_hosts {
            metrics.hosts.clear();
        }
        metrics
    }

    fn collect_all(&self) -> CollectedMetrics {
        CollectedMetrics {
            timestamp: Some(Instant::now()),
            pipeline: self.pipeline.as_ref().map(|p| p.pipeline_snapshot()),
            sources: self
                .sources
                .iter()
                .map(|s| CollectedSource {
                    id: s.source_id().to_string(),
                    source_type: s.source_type().to_string(),
                    snapshot: s.snapshot(),
                })
                .collect(),
            hosts: self
                .hosts
                .iter()
                .map(|h| CollectedHost {
                    id: h.host_id().to_string(),
                    cluster: h.cluster().to_string(),
                    snapshot: h.snapshot(),
                })
                .collect(),
        }
    }
}
