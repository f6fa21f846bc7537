//! Egress over the streaming RPC
//!
//! A host with `grpc = true` forwards records to another relay through the
//! client-streaming `relay.Relay/Stream` call instead of plaintext TCP. The
//! call runs in its own task fed by a small channel; when the remote ends the
//! call the channel closes and the next write fails, which sends the
//! streamer through the usual reconnect path.

use relay_protocol::Record;
use relay_protocol::rpc::relay_client::RelayClient;
use relay_protocol::rpc::{MetricRecord, StreamSummary};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;

use crate::error::{HostError, Result};
use crate::host::{Endpoint, HostOptions};

/// In-flight messages between the streamer and the call task
const STREAM_BUFFER: usize = 1024;

type CallResult = std::result::Result<StreamSummary, tonic::Status>;

/// One open client-streaming call
pub(crate) struct GrpcLink {
    sender: mpsc::Sender<MetricRecord>,
    call: JoinHandle<CallResult>,
    addr: String,
    send_timeout: std::time::Duration,
}

impl GrpcLink {
    pub(crate) async fn dial(endpoint: &Endpoint, options: &HostOptions) -> Result<Self> {
        let addr = endpoint.to_string();
        let uri = format!("http://{addr}");

        let mut builder = Channel::from_shared(uri)
            .map_err(|e| HostError::StreamClosed(format!("invalid endpoint {addr}: {e}")))?
            .connect_timeout(options.connect_timeout)
            .tcp_nodelay(true);
        if !options.keepalive.is_zero() {
            builder = builder.tcp_keepalive(Some(options.keepalive));
        }

        let channel = match timeout(options.connect_timeout, builder.connect()).await {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => return Err(HostError::Transport(e)),
            Err(_) => {
                return Err(HostError::ConnectTimeout {
                    addr,
                    timeout: options.connect_timeout,
                });
            }
        };

        let (sender, receiver) = mpsc::channel(STREAM_BUFFER);
        let mut client = RelayClient::new(channel);
        let call = tokio::spawn(async move {
            client
                .stream(ReceiverStream::new(receiver))
                .await
                .map(tonic::Response::into_inner)
        });

        Ok(Self {
            sender,
            call,
            addr,
            send_timeout: options.send_timeout,
        })
    }

    pub(crate) async fn write(&mut self, record: &Record) -> Result<()> {
        self.sender
            .send(MetricRecord::from(record))
            .await
            .map_err(|_| HostError::StreamClosed(format!("{} ended the stream", self.addr)))
    }

    /// Close our side and wait for the remote's summary
    pub(crate) async fn shutdown(self) -> Result<()> {
        drop(self.sender);

        match timeout(self.send_timeout, self.call).await {
            Ok(Ok(Ok(summary))) => {
                tracing::debug!(
                    host = %self.addr,
                    received = summary.received_count,
                    errors = summary.error_count,
                    "grpc stream closed"
                );
                Ok(())
            }
            Ok(Ok(Err(status))) => Err(HostError::StreamClosed(status.message().to_string())),
            Ok(Err(join)) => Err(HostError::StreamClosed(join.to_string())),
            Err(_) => Err(HostError::WriteTimeout(self.send_timeout)),
        }
    }
}
