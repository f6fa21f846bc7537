//! Relay Protocol - Graphite line protocol core types
//!
//! This crate provides the types that flow through the relay:
//! - `Record` - One parsed data point, shared read-only by senders
//! - `Payload` - A main-queue slot (single line or line batch)
//! - `normalize` - Path normalizer driven by a 256-entry byte table
//! - `rpc` - Streaming RPC messages and the generated `relay.Relay` service
//!
//! # Wire format
//!
//! ```text
//! <path>[;<tag>=<val>...] <value> <timestamp>\n
//! ```
//!
//! Fields are separated by runs of ASCII whitespace. The raw value and
//! timestamp are preserved byte-for-byte on the way out.
//!
//! # Design Principles
//!
//! - **Zero-copy**: Record fields are `bytes::Bytes` slices of the input line
//! - **Table-driven**: Normalization is a single pass with no branching per class
//! - **Arc-friendly**: Records are immutable once routed

mod error;
pub mod normalize;
mod payload;
mod record;
pub mod rpc;

pub use error::ParseError;
pub use normalize::normalize;
pub use payload::{LineBatch, Payload};
pub use record::Record;

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

/// Result type for parse operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Largest UDP datagram the relay reads
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Default TCP/UDP Graphite plaintext port
pub const DEFAULT_GRAPHITE_PORT: u16 = 2003;

// Test modules - only compiled during testing
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod normalize_test;
#[cfg(test)]
mod record_test;
#[cfg(test)]
mod rpc_test;
