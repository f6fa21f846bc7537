//! Wire connections to downstream hosts
//!
//! A `Link` is one established connection. Plain hosts get a buffered TCP
//! stream carrying Graphite lines; gRPC hosts get a client-streaming call
//! (see [`crate::grpc_host`]).

use std::time::Duration;

use relay_protocol::Record;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{HostError, Result};
use crate::grpc_host::GrpcLink;
use crate::host::{Endpoint, HostOptions, Protocol};

/// One established connection
pub(crate) enum Link {
    Tcp(TcpLink),
    Grpc(GrpcLink),
}

impl Link {
    /// Dial `endpoint` with the configured connect timeout
    pub(crate) async fn dial(endpoint: &Endpoint, options: &HostOptions) -> Result<Self> {
        match endpoint.protocol {
            Protocol::Plain => TcpLink::dial(endpoint, options).await.map(Self::Tcp),
            Protocol::Grpc => GrpcLink::dial(endpoint, options).await.map(Self::Grpc),
        }
    }

    /// Write one record; `buf` is scratch space reused across calls
    pub(crate) async fn write(&mut self, record: &Record, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Tcp(link) => link.write(record, buf).await,
            Self::Grpc(link) => link.write(record).await,
        }
    }

    /// Push buffered bytes to the socket
    pub(crate) async fn flush(&mut self) -> Result<()> {
        match self {
            Self::Tcp(link) => link.flush().await,
            Self::Grpc(_) => Ok(()),
        }
    }

    /// Flush and close
    pub(crate) async fn shutdown(self) -> Result<()> {
        match self {
            Self::Tcp(link) => link.shutdown().await,
            Self::Grpc(link) => link.shutdown().await,
        }
    }
}

/// Buffered plaintext TCP connection
pub(crate) struct TcpLink {
    writer: BufWriter<TcpStream>,
}

impl TcpLink {
    async fn dial(endpoint: &Endpoint, options: &HostOptions) -> Result<Self> {
        let connect = TcpStream::connect((endpoint.name.as_str(), endpoint.port));
        let stream = match timeout(options.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(HostError::connect(endpoint.to_string(), e)),
            Err(_) => {
                return Err(HostError::ConnectTimeout {
                    addr: endpoint.to_string(),
                    timeout: options.connect_timeout,
                });
            }
        };

        tune_socket(&stream, options.keepalive);

        // A zero capacity passes every write straight to the socket
        Ok(Self {
            writer: BufWriter::with_capacity(options.buffer_size, stream),
        })
    }

    async fn write(&mut self, record: &Record, buf: &mut Vec<u8>) -> Result<()> {
        buf.clear();
        record.serialize_into(buf);
        self.writer.write_all(buf).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    async fn shutdown(mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Apply `TCP_NODELAY` and keep-alive; failures are logged and ignored
pub(crate) fn tune_socket(stream: &TcpStream, keepalive: Duration) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(error = %e, "failed to set TCP_NODELAY, continuing with default buffering");
    }

    if keepalive.is_zero() {
        return;
    }

    let sock_ref = SockRef::from(stream);
    let params = TcpKeepalive::new().with_time(keepalive);

    // On Linux, also set the interval between probes
    #[cfg(target_os = "linux")]
    let params = params.with_interval(keepalive);

    if let Err(e) = sock_ref.set_tcp_keepalive(&params) {
        tracing::debug!(error = %e, "failed to set TCP keep-alive, continuing without keep-alive");
    }
}
