//! UDP listener tests

use std::time::Duration;

use relay_config::ListenConfig;
use relay_metrics::SourceMetricsProvider;
use relay_protocol::{Bytes, Payload};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{MainSender, UdpLineListener, UdpListenerConfig, datagram_lines};

fn lines(datagram: &'static [u8]) -> Vec<Bytes> {
    datagram_lines(&Bytes::from_static(datagram)).collect()
}

// ============================================================================
// Datagram Splitting
// ============================================================================

#[test]
fn test_datagram_complete_lines() {
    assert_eq!(
        lines(b"a 1 1\nb 2 2\n"),
        vec![Bytes::from_static(b"a 1 1"), Bytes::from_static(b"b 2 2")]
    );
}

#[test]
fn test_datagram_trailing_partial_dropped() {
    assert_eq!(lines(b"a 1 1\nb 2"), vec![Bytes::from_static(b"a 1 1")]);
    assert!(lines(b"no newline at all").is_empty());
}

#[test]
fn test_datagram_newline_only() {
    assert!(lines(b"\n").is_empty());
    assert!(lines(b"\n\n\n").is_empty());
    assert!(lines(b"").is_empty());
}

#[test]
fn test_datagram_skips_empty_lines() {
    assert_eq!(
        lines(b"\na 1 1\n\n\nb 2 2\n"),
        vec![Bytes::from_static(b"a 1 1"), Bytes::from_static(b"b 2 2")]
    );
}

#[test]
fn test_config_from_listen() {
    let listen = ListenConfig {
        udp: Some("127.0.0.1:2003".into()),
        udp_os_buffer_size: 1 << 20,
        ..Default::default()
    };
    let config = UdpListenerConfig::from_config(&listen).unwrap();
    assert_eq!(config.address, "127.0.0.1:2003");
    assert_eq!(config.recv_buffer_size, 1 << 20);
    assert!(UdpListenerConfig::from_config(&ListenConfig::default()).is_none());
}

// ============================================================================
// Listener
// ============================================================================

#[tokio::test]
async fn test_datagrams_pushed() {
    let (tx, rx) = crossfire::mpmc::bounded_async::<Payload>(100);
    let config = UdpListenerConfig {
        address: "127.0.0.1:0".into(),
        recv_buffer_size: 256 * 1024,
        max_line_len: 16,
    };
    let listener = UdpLineListener::bind(config, MainSender::new(tx)).await.unwrap();
    let addr = listener.local_addr();
    let metrics = listener.metrics_handle();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(listener.run(cancel.clone()));

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"\n", addr).await.unwrap();
    client
        .send_to(b"a.b 1 100\nthis.is.way.too.long 1 1\nc.d 2 200\npartial", addr)
        .await
        .unwrap();

    let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(first, Payload::Line(Bytes::from_static(b"a.b 1 100")));
    assert_eq!(second, Payload::Line(Bytes::from_static(b"c.d 2 200")));

    cancel.cancel();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.in_recs, 2);
    assert_eq!(snapshot.oversized_recs, 1);
    assert_eq!(metrics.source_type(), "udp");

    // Nothing else was queued and the sender is gone
    assert!(rx.recv().await.is_err());
}
