//! Host sender error types

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors on the connection to a downstream host
///
/// None of these reach producers: the streamer counts them, closes the
/// connection and retries the same record.
#[derive(Debug, Error)]
pub enum HostError {
    /// Dial failed
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Dial did not finish within `out_conn_timeout`
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Write or flush failed
    #[error("write failed: {0}")]
    Write(#[from] io::Error),

    /// Write did not finish within `send_timeout`
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// gRPC channel could not be established
    #[error("grpc transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Remote relay closed the stream
    #[error("grpc stream closed: {0}")]
    StreamClosed(String),

    /// Cluster set could not be built
    #[error("cluster '{cluster}': {message}")]
    InvalidCluster { cluster: String, message: String },
}

impl HostError {
    /// Create a Connect error
    #[inline]
    pub fn connect(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Connect {
            addr: addr.into(),
            source,
        }
    }

    /// Create an InvalidCluster error
    pub fn invalid_cluster(cluster: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCluster {
            cluster: cluster.into(),
            message: message.into(),
        }
    }

    /// Short label for logs and counters
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::Write(_) => "write",
            Self::WriteTimeout(_) => "write_timeout",
            Self::Transport(_) => "transport",
            Self::StreamClosed(_) => "stream_closed",
            Self::InvalidCluster { .. } => "invalid_cluster",
        }
    }
}
