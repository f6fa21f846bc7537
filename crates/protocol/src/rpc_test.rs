//! Tests for RPC message conversions

use std::time::Instant;

use bytes::Bytes;
use prost::Message;

use crate::record::Record;
use crate::rpc::{MetricRecord, StreamSummary};

#[test]
fn test_metric_record_to_line_parses() {
    let msg = MetricRecord {
        path: "a.b;env=prod".to_string(),
        value: 0.25,
        time: 1600000000,
    };

    let line = msg.to_line();
    assert_eq!(line, Bytes::from_static(b"a.b;env=prod 0.25 1600000000"));

    let rec = Record::parse(&line, true, Instant::now()).unwrap();
    assert_eq!(rec.path(), "a.b");
    assert_eq!(rec.value(), 0.25);
    assert_eq!(rec.time(), 1600000000);
}

#[test]
fn test_metric_record_from_record() {
    let line = Bytes::from_static(b"x.y;dc=1 7 42");
    let rec = Record::parse(&line, true, Instant::now()).unwrap();

    let msg = MetricRecord::from(&rec);
    assert_eq!(msg.path, "x.y;dc=1");
    assert_eq!(msg.value, 7.0);
    assert_eq!(msg.time, 42);
}

#[test]
fn test_messages_encode_decode() {
    let msg = MetricRecord {
        path: "a".to_string(),
        value: -1.5,
        time: 9,
    };
    let decoded = MetricRecord::decode(msg.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded, msg);

    let summary = StreamSummary {
        received_count: 10,
        error_count: 1,
    };
    let decoded = StreamSummary::decode(summary.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded, summary);
}
