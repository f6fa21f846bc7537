//! UDP datagram listener
//!
//! One reader per socket. Each datagram (up to 64 KiB) is split on `\n`:
//! complete lines are pushed onto the main queue, empty lines are skipped and
//! the trailing bytes after the last `\n` are discarded, since a line cannot
//! continue in another datagram.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use relay_config::ListenConfig;
use relay_metrics::{LogSampler, SourceMetrics};
use relay_protocol::{MAX_DATAGRAM_SIZE, Payload};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SourceError};
use crate::sender::{ListenerMetricsHandle, MainSender, Push};

/// UDP listener configuration
#[derive(Debug, Clone)]
pub struct UdpListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2003")
    pub address: String,

    /// SO_RCVBUF; 0 keeps the OS default
    pub recv_buffer_size: usize,

    /// Longest accepted line in bytes
    pub max_line_len: usize,
}

impl Default for UdpListenerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:2003".into(),
            recv_buffer_size: 0,
            max_line_len: 4096,
        }
    }
}

impl UdpListenerConfig {
    /// Listener settings from `[listen]`, `None` when `udp` is unset
    pub fn from_config(listen: &ListenConfig) -> Option<Self> {
        Some(Self {
            address: listen.udp.clone()?,
            recv_buffer_size: listen.udp_os_buffer_size,
            max_line_len: listen.max_line_len,
        })
    }
}

/// Complete, non-empty lines of one datagram
///
/// Bytes after the last `\n` are not returned.
pub fn datagram_lines(datagram: &Bytes) -> impl Iterator<Item = Bytes> + '_ {
    let complete = datagram
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);

    let mut start = 0;
    std::iter::from_fn(move || {
        while start < complete {
            let end = start
                + datagram[start..complete]
                    .iter()
                    .position(|&b| b == b'\n')
                    .unwrap_or(complete - start);
            let line = datagram.slice(start..end);
            start = end + 1;
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    })
}

/// Bound UDP listener
pub struct UdpLineListener {
    config: UdpListenerConfig,
    socket: UdpSocket,
    local_addr: SocketAddr,
    sender: MainSender,
    metrics: Arc<SourceMetrics>,
    sampler: LogSampler,
}

impl UdpLineListener {
    /// Bind the listen address with the configured receive buffer
    pub async fn bind(config: UdpListenerConfig, sender: MainSender) -> Result<Self> {
        let addr = resolve(&config.address).await?;
        let socket = bind_socket(addr, config.recv_buffer_size)
            .map_err(|e| SourceError::bind(&config.address, e))?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            config,
            socket,
            local_addr,
            sender,
            metrics: Arc::new(SourceMetrics::new()),
            sampler: LogSampler::default(),
        })
    }

    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sampler = LogSampler::new(interval);
        self
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> ListenerMetricsHandle {
        ListenerMetricsHandle {
            id: self.local_addr.to_string(),
            source_type: "udp",
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Read datagrams until cancelled; the socket is closed on return
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut recv_buf = vec![0u8; MAX_DATAGRAM_SIZE];

        tracing::info!(
            address = %self.local_addr,
            recv_buffer_size = self.config.recv_buffer_size,
            "udp listener started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                received = self.socket.recv_from(&mut recv_buf) => match received {
                    Ok((len, _peer)) => {
                        self.metrics.record_bytes(len as u64);
                        let datagram = Bytes::copy_from_slice(&recv_buf[..len]);
                        if !self.process(&datagram) {
                            break;
                        }
                    }
                    Err(e) => {
                        self.metrics.record_error();
                        if let Some(suppressed) = self.sampler.sample() {
                            tracing::warn!(error = %e, suppressed, "udp receive error");
                        }
                    }
                },
            }
        }

        tracing::info!(address = %self.local_addr, "udp listener stopped");
        Ok(())
    }

    /// Push the lines of one datagram; false once the queue is closed
    fn process(&self, datagram: &Bytes) -> bool {
        for line in datagram_lines(datagram) {
            if line.len() > self.config.max_line_len {
                self.metrics.record_oversized();
                continue;
            }
            if self.sender.push(Payload::Line(line), &self.metrics) == Push::Closed {
                return false;
            }
        }
        true
    }
}

async fn resolve(address: &str) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host(address)
        .await
        .map_err(|e| SourceError::bind(address, e))?;
    addrs.next().ok_or_else(|| SourceError::InvalidAddress {
        address: address.to_string(),
        message: "resolves to no address".into(),
    })
}

fn bind_socket(addr: SocketAddr, recv_buffer_size: usize) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;

    if recv_buffer_size > 0
        && let Err(e) = socket.set_recv_buffer_size(recv_buffer_size)
    {
        tracing::warn!(
            error = %e,
            requested_size = recv_buffer_size,
            "failed to set UDP SO_RCVBUF"
        );
    }

    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
