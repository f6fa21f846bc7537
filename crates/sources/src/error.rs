//! Listener error types

use std::io;

use thiserror::Error;

/// Result type for listener operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that stop a listener
///
/// Per-connection and per-datagram problems never surface here; they are
/// counted and logged where they happen.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to bind the listen address
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Listen address does not parse
    #[error("invalid listen address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    /// I/O error on the listening socket
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// RPC server failed
    #[error("grpc server error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl SourceError {
    /// Create a Bind error
    #[inline]
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }
}
