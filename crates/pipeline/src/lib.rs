//! Relay - Pipeline
//!
//! The worker pool that connects the main queue to the host queues.
//!
//! # Architecture
//!
//! ```text
//! [Listeners]                 [Workers x N]                       [Hosts]
//!    TCP ────┐                                                  ┌──→ carbon-0
//!    UDP ────┼──→ main queue ──→ parse → rewrite → Rules ──→ ClusterSet ──→ carbon-1
//!    gRPC ───┘     (mpmc)                                       └──→ carbon-2
//! ```
//!
//! # Key Design
//!
//! - **Shared receiver**: every worker reads the same `crossfire` mpmc queue
//! - **Arc fan-out**: a record is wrapped in `Arc` once and shared by every
//!   host queue it lands in
//! - **Backpressure**: host pushes never block; full queues are counted in
//!   `throttled_host`
//! - **Ownership-driven drain**: the pool owns the cluster set, so host queues
//!   close only after the last worker is done

mod metrics;
mod worker;

pub use metrics::{PipelineMetrics, PipelineMetricsHandle, Totals};
pub use worker::{WorkerOptions, WorkerPool};
