//! Streaming RPC listener
//!
//! Serves `relay.Relay/Stream`: a client streams [`MetricRecord`] messages,
//! each one is rendered as a Graphite line and pushed onto the main queue,
//! and the call ends with a [`StreamSummary`] once the client closes its
//! side.
//!
//! A message that fails to decode is counted in `error_count` and the call
//! keeps receiving; the stream ends at end-of-stream or when the transport
//! gives up. On cancellation the server stops accepting calls and every open
//! stream is closed right away with its summary so far.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use relay_config::ListenConfig;
use relay_metrics::{LogSampler, SourceMetrics};
use relay_protocol::Payload;
use relay_protocol::rpc::relay_server::{Relay, RelayServer};
use relay_protocol::rpc::{MetricRecord, StreamSummary};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};

use crate::error::{Result, SourceError};
use crate::sender::{ListenerMetricsHandle, MainSender, Push};

/// RPC listener configuration
#[derive(Debug, Clone)]
pub struct GrpcListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2004")
    pub address: String,
}

impl GrpcListenerConfig {
    /// Listener settings from `[listen]`, `None` when `grpc` is unset
    pub fn from_config(listen: &ListenConfig) -> Option<Self> {
        Some(Self {
            address: listen.grpc.clone()?,
        })
    }
}

/// `relay.Relay` implementation feeding the main queue
struct RelayService {
    sender: MainSender,
    metrics: Arc<SourceMetrics>,
    sampler: Arc<LogSampler>,
    cancel: CancellationToken,
}

#[tonic::async_trait]
impl Relay for RelayService {
    async fn stream(
        &self,
        request: Request<Streaming<MetricRecord>>,
    ) -> std::result::Result<Response<StreamSummary>, Status> {
        let peer = request.remote_addr();
        let mut stream = request.into_inner();
        let mut summary = StreamSummary::default();

        self.metrics.connection_opened();
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = stream.message() => received,
            };
            match received {
                Ok(Some(message)) => {
                    summary.received_count += 1;
                    let line = message.to_line();
                    self.metrics.record_bytes(line.len() as u64);
                    if self.sender.push(Payload::Line(line), &self.metrics) == Push::Closed {
                        break;
                    }
                }
                Ok(None) => break,
                Err(status) => {
                    summary.error_count += 1;
                    self.metrics.record_error();
                    if let Some(suppressed) = self.sampler.sample() {
                        tracing::warn!(
                            peer = ?peer,
                            code = ?status.code(),
                            error = %status.message(),
                            suppressed,
                            "grpc receive error"
                        );
                    }
                }
            }
        }
        self.metrics.connection_closed();

        tracing::debug!(
            peer = ?peer,
            received = summary.received_count,
            errors = summary.error_count,
            "grpc stream finished"
        );
        Ok(Response::new(summary))
    }
}

/// Bound RPC listener
pub struct GrpcLineListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: RelayService,
}

impl GrpcLineListener {
    /// Bind the listen address
    pub async fn bind(config: GrpcListenerConfig, sender: MainSender) -> Result<Self> {
        let listener = TcpListener::bind(&config.address)
            .await
            .map_err(|e| SourceError::bind(&config.address, e))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            service: RelayService {
                sender,
                metrics: Arc::new(SourceMetrics::new()),
                sampler: Arc::new(LogSampler::default()),
                cancel: CancellationToken::new(),
            },
        })
    }

    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.service.sampler = Arc::new(LogSampler::new(interval));
        self
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> ListenerMetricsHandle {
        ListenerMetricsHandle {
            id: self.local_addr.to_string(),
            source_type: "grpc",
            metrics: Arc::clone(&self.service.metrics),
        }
    }

    /// Serve until cancelled; open streams end with their summary
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(address = %self.local_addr, "grpc listener started");

        self.service.cancel = cancel.clone();

        let shutdown = async move { cancel.cancelled().await };
        tonic::transport::Server::builder()
            .add_service(RelayServer::new(self.service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), shutdown)
            .await?;

        tracing::info!(address = %self.local_addr, "grpc listener stopped");
        Ok(())
    }
}
