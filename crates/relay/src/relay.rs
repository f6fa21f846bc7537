//! Relay startup and ordered shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use relay_metrics::{
    HostMetricsProvider, PipelineMetricsProvider, Reporter, ReporterBuilder, SourceMetricsProvider,
};
use relay_pipeline::{PipelineMetricsHandle, WorkerOptions, WorkerPool};
use relay_protocol::Payload;
use relay_routing::Rules;
use relay_sinks::ClusterSet;
use relay_sources::{
    GrpcLineListener, GrpcListenerConfig, MainSender, TcpLineListener, TcpListenerConfig,
    UdpLineListener, UdpListenerConfig,
};
use relay_transform::Rewriter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::configs::Configs;

/// Logged and returned when shutdown exceeds `term_timeout`
pub const FORCE_QUIT_MESSAGE: &str = "force quit: queue not fully flushed";

/// Addresses the listeners actually bound
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundAddrs {
    pub tcp: Option<SocketAddr>,
    pub udp: Option<SocketAddr>,
    pub grpc: Option<SocketAddr>,
}

/// A running relay
///
/// Holds every task handle plus the coordinator's own main-queue sender,
/// which is the last one dropped during shutdown.
pub struct Relay {
    cancel: CancellationToken,
    addrs: BoundAddrs,
    main_sender: MainSender,
    listeners: Vec<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    streamers: Vec<JoinHandle<()>>,
    reporter: JoinHandle<()>,
    totals: Reporter,
    pipeline: PipelineMetricsHandle,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
    hosts: Vec<Arc<dyn HostMetricsProvider>>,
    term_timeout: Duration,
}

impl Relay {
    /// Build every component, bind the listeners and spawn all tasks
    ///
    /// Fails before any task is spawned if a cluster, rule or rewrite does
    /// not compile or a listener cannot bind.
    pub async fn start(configs: Configs) -> Result<Self> {
        let host_options = configs.host_options();
        let Configs {
            main,
            clusters,
            rules,
            rewrites,
        } = configs;
        let sample_interval = main.log.error_sample_interval;

        let (cluster_set, streamers) = ClusterSet::from_config(&clusters, Arc::new(host_options))
            .context("failed to build clusters")?;
        let rules = Rules::from_config(&rules, &cluster_set.names()).context("failed to compile rules")?;
        let rewriter = Rewriter::from_config(&rewrites).context("failed to compile rewrites")?;

        info!(
            clusters = cluster_set.len(),
            host_connections = streamers.len(),
            rules = rules.len(),
            rewrites = rewriter.len(),
            "routing configured"
        );

        let (tx, rx) = crossfire::mpmc::bounded_async::<Payload>(main.global.main_queue_size.max(1));
        let main_sender = MainSender::new(tx);

        // Bind everything first so a port conflict leaves nothing running
        let mut addrs = BoundAddrs::default();
        let mut sources: Vec<Arc<dyn SourceMetricsProvider>> = Vec::new();

        let tcp = match TcpListenerConfig::from_config(&main.listen) {
            Some(config) => {
                let listener = TcpLineListener::bind(config, main_sender.clone())
                    .await
                    .context("failed to start tcp listener")?
                    .with_sample_interval(sample_interval);
                addrs.tcp = Some(listener.local_addr());
                sources.push(Arc::new(listener.metrics_handle()));
                Some(listener)
            }
            None => None,
        };
        let udp = match UdpListenerConfig::from_config(&main.listen) {
            Some(config) => {
                let listener = UdpLineListener::bind(config, main_sender.clone())
                    .await
                    .context("failed to start udp listener")?
                    .with_sample_interval(sample_interval);
                addrs.udp = Some(listener.local_addr());
                sources.push(Arc::new(listener.metrics_handle()));
                Some(listener)
            }
            None => None,
        };
        let grpc = match GrpcListenerConfig::from_config(&main.listen) {
            Some(config) => {
                let listener = GrpcLineListener::bind(config, main_sender.clone())
                    .await
                    .context("failed to start grpc listener")?
                    .with_sample_interval(sample_interval);
                addrs.grpc = Some(listener.local_addr());
                sources.push(Arc::new(listener.metrics_handle()));
                Some(listener)
            }
            None => None,
        };

        let hosts: Vec<Arc<dyn HostMetricsProvider>> = cluster_set
            .metrics_handles()
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn HostMetricsProvider>)
            .collect();

        let pool = WorkerPool::new(
            rules,
            rewriter,
            cluster_set,
            WorkerOptions::from_config(&main.global, &main.log),
        );
        let pipeline = pool.metrics_handle();

        let reporter_builder = ReporterBuilder::new()
            .config(main.metrics.clone())
            .pipeline(Arc::new(pipeline.clone()) as Arc<dyn PipelineMetricsProvider>)
            .sources(sources.clone())
            .hosts(hosts.clone());
        let totals = reporter_builder.clone().build();

        let cancel = CancellationToken::new();

        // Downstream first, so nothing is queued without a consumer
        let streamers = streamers
            .into_iter()
            .map(|streamer| tokio::spawn(streamer.run()))
            .collect();
        let workers = pool.spawn(rx);

        let mut listeners = Vec::new();
        if let Some(listener) = tcp {
            let cancel = cancel.clone();
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.run(cancel).await {
                    error!(error = %e, "tcp listener error");
                }
            }));
        }
        if let Some(listener) = udp {
            let cancel = cancel.clone();
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.run(cancel).await {
                    error!(error = %e, "udp listener error");
                }
            }));
        }
        if let Some(listener) = grpc {
            let cancel = cancel.clone();
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.run(cancel).await {
                    error!(error = %e, "grpc listener error");
                }
            }));
        }

        let reporter = tokio::spawn(reporter_builder.build().run(cancel.clone()));

        info!(
            listeners = ?main.enabled_listeners(),
            workers = main.global.workers,
            main_queue_size = main.global.main_queue_size,
            host_queue_size = main.global.host_queue_size,
            pprof_port = ?main.global.pprof_port,
            prom_port = ?main.global.prom_port,
            "relay running"
        );

        Ok(Self {
            cancel,
            addrs,
            main_sender,
            listeners,
            workers,
            streamers,
            reporter,
            totals,
            pipeline,
            sources,
            hosts,
            term_timeout: main.global.term_timeout,
        })
    }

    /// Addresses the listeners bound
    pub fn addrs(&self) -> BoundAddrs {
        self.addrs
    }

    /// Worker pool counters
    pub fn pipeline_metrics(&self) -> PipelineMetricsHandle {
        self.pipeline.clone()
    }

    /// Listener counters, one per bound listener
    pub fn source_metrics(&self) -> Vec<Arc<dyn SourceMetricsProvider>> {
        self.sources.clone()
    }

    /// Host counters, one per downstream host
    ///
    /// Handles stay valid after shutdown.
    pub fn host_metrics(&self) -> Vec<Arc<dyn HostMetricsProvider>> {
        self.hosts.clone()
    }

    /// Stop and drain, bounded by `term_timeout`
    ///
    /// Returns an error carrying [`FORCE_QUIT_MESSAGE`] when the deadline
    /// passes first; tasks still running are abandoned.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            cancel,
            main_sender,
            listeners,
            workers,
            streamers,
            reporter,
            totals,
            term_timeout,
            ..
        } = self;

        info!(term_timeout = ?term_timeout, "shutting down");
        cancel.cancel();

        let drained = tokio::time::timeout(
            term_timeout,
            drain(main_sender, listeners, workers, streamers),
        )
        .await;

        if let Err(e) = reporter.await {
            warn!(error = %e, "metrics reporter panicked");
        }
        totals.log_totals();

        match drained {
            Ok(()) => {
                info!("shutdown complete");
                Ok(())
            }
            Err(_) => {
                error!(term_timeout = ?term_timeout, "{FORCE_QUIT_MESSAGE}");
                Err(anyhow::anyhow!(FORCE_QUIT_MESSAGE))
            }
        }
    }
}

/// Listeners, then the main queue, then workers, then host streamers
async fn drain(
    main_sender: MainSender,
    listeners: Vec<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    streamers: Vec<JoinHandle<()>>,
) {
    info!(listeners = listeners.len(), "waiting for listeners to stop");
    for task in listeners {
        if let Err(e) = task.await {
            warn!(error = %e, "listener task panicked");
        }
    }

    // Last sender; workers see the queue close once it is empty
    drop(main_sender);

    info!(workers = workers.len(), "waiting for workers to drain");
    for task in workers {
        if let Err(e) = task.await {
            warn!(error = %e, "worker panicked");
        }
    }

    // The last worker released the cluster set, closing every host queue
    info!(connections = streamers.len(), "waiting for host senders to flush");
    for task in streamers {
        if let Err(e) = task.await {
            warn!(error = %e, "host streamer panicked");
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("addrs", &self.addrs)
            .field("listeners", &self.listeners.len())
            .field("workers", &self.workers.len())
            .field("streamers", &self.streamers.len())
            .field("term_timeout", &self.term_timeout)
            .finish()
    }
}
