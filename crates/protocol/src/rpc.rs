//! Streaming RPC wire types
//!
//! `relay.Relay/Stream` is a client-streaming call: the client sends a
//! sequence of [`MetricRecord`] messages and gets one [`StreamSummary`] back
//! when it closes its side.
//!
//! ```text
//! message MetricRecord  { string path = 1; double value = 2; uint32 time = 3; }
//! message StreamSummary { uint64 received_count = 1; uint64 error_count = 2; }
//! service Relay { rpc Stream(stream MetricRecord) returns (StreamSummary); }
//! ```

use bytes::Bytes;

use crate::record::Record;

include!(concat!(env!("OUT_DIR"), "/relay.Relay.rs"));

/// One data point on the RPC wire
#[derive(Clone, PartialEq, prost::Message)]
pub struct MetricRecord {
    /// Full path, tags included
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(uint32, tag = "3")]
    pub time: u32,
}

/// Per-stream reply
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub struct StreamSummary {
    #[prost(uint64, tag = "1")]
    pub received_count: u64,
    #[prost(uint64, tag = "2")]
    pub error_count: u64,
}

impl MetricRecord {
    /// Render as a plaintext Graphite line (no newline) for the main queue
    pub fn to_line(&self) -> Bytes {
        Bytes::from(format!("{} {} {}", self.path, self.value, self.time))
    }
}

impl From<&Record> for MetricRecord {
    fn from(record: &Record) -> Self {
        Self {
            path: record.full_path(),
            value: record.value(),
            time: record.time(),
        }
    }
}
