//! Relay Sinks - downstream clusters and host senders
//!
//! Records leave the relay through clusters. A cluster owns a list of
//! hosts and decides which of them get a record; a host owns one bounded
//! queue and one connection per sub-connection.
//!
//! # Architecture
//!
//! ```text
//! [worker] --Arc<Record>--> ClusterSet::push(id)
//!                               |
//!                     Cluster (jump / lb / toall / blackhole)
//!                               |
//!                   Host::push --try_send--> [host queue] --> HostStreamer --> TCP / gRPC
//! ```
//!
//! Producers never block: a full host queue drops the record and counts it
//! as `throttled_host`. Streamers never drop: a record is retried over
//! reconnects until it is written.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_sinks::{ClusterSet, HostOptions};
//!
//! let options = Arc::new(HostOptions::from_config(&config.sender, config.global.host_queue_size));
//! let (clusters, streamers) = ClusterSet::from_config(&clusters_config, options)?;
//! for streamer in streamers {
//!     tokio::spawn(streamer.run());
//! }
//! ```

mod backoff;
mod cluster;
mod error;
mod grpc_host;
mod hash;
mod host;
mod link;
mod metrics;

pub use backoff::{Backoff, BackoffConfig};
pub use cluster::{Cluster, ClusterSet, Delivery};
pub use error::{HostError, Result};
pub use hash::{fnv1a_64, jump_hash};
pub use host::{Endpoint, Host, HostOptions, HostStreamer, Protocol};
pub use metrics::{HostMetrics, HostMetricsHandle};
