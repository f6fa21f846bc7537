//! Relay Sources - ingress listeners
//!
//! Listeners receive Graphite lines and push them onto the main queue.
//!
//! # Available Listeners
//!
//! - **TCP** - `\n`-delimited lines, one queue slot per line
//! - **Batched TCP** - same wire, one queue slot per batch of lines
//! - **UDP** - one datagram holds any number of complete lines
//! - **gRPC** - client-streaming `relay.Relay/Stream` calls
//!
//! # Backpressure
//!
//! Every listener pushes with `try_send`. A full main queue drops the lines
//! and counts them as `throttled_recs`; listeners never wait on workers.
//!
//! # Example
//!
//! ```ignore
//! use relay_sources::{MainSender, TcpLineListener, TcpListenerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let (tx, rx) = crossfire::mpmc::bounded_async(10_000);
//! let listener = TcpLineListener::bind(TcpListenerConfig::default(), MainSender::new(tx)).await?;
//! let cancel = CancellationToken::new();
//! tokio::spawn(listener.run(cancel.clone()));
//! ```

mod error;
mod grpc;
mod line;
mod sender;
mod tcp;
mod udp;

pub use error::{Result, SourceError};
pub use grpc::{GrpcLineListener, GrpcListenerConfig};
pub use sender::{ListenerMetricsHandle, MainSender, Push};
pub use tcp::{BatchSettings, TcpLineListener, TcpListenerConfig};
pub use udp::{UdpLineListener, UdpListenerConfig, datagram_lines};

#[cfg(test)]
mod udp_test;
