//! TCP line listener
//!
//! Accepts plaintext Graphite connections and pushes every `\n`-terminated
//! line onto the main queue.
//!
//! # Modes
//!
//! - **line** (default): one main-queue slot per line
//! - **batched** (`listen.batching.enabled`): each connection accumulates up
//!   to `batch_size` lines and pushes them as one slot, on full or every
//!   `flush_interval`
//!
//! # Lifecycle
//!
//! `run()` accepts until the cancellation token fires, then waits for every
//! connection reader to exit before returning. Readers stop on
//! cancellation, on end of stream, on a read error, or after
//! `incoming_conn_idle_timeout` without a line. On cancellation a reader
//! first hands over every complete line it already buffered, without
//! reading the socket again. A batched reader pushes its partial batch
//! before exiting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use relay_config::ListenConfig;
use relay_metrics::{LogSampler, SourceMetrics};
use relay_protocol::{LineBatch, Payload};
use socket2::{SockRef, TcpKeepalive};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{Result, SourceError};
use crate::line::{ReadLine, is_connection_reset, read_bounded_line, take_buffered_line};
use crate::sender::{ListenerMetricsHandle, MainSender, Push};

/// Read buffer per connection
const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Keep-alive on accepted connections
const KEEPALIVE: Duration = Duration::from_secs(30);

/// Batched mode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

/// TCP listener configuration
#[derive(Debug, Clone)]
pub struct TcpListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2003")
    pub address: String,

    /// Close a connection after this long without a line; 0 disables
    pub idle_timeout: Duration,

    /// Longest accepted line in bytes
    pub max_line_len: usize,

    /// Read buffer per connection
    pub read_buffer_size: usize,

    /// Push line batches instead of single lines
    pub batching: Option<BatchSettings>,
}

impl Default for TcpListenerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:2003".into(),
            idle_timeout: Duration::from_secs(90),
            max_line_len: 4096,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            batching: None,
        }
    }
}

impl TcpListenerConfig {
    /// Listener settings from `[listen]`, `None` when `tcp` is unset
    pub fn from_config(listen: &ListenConfig) -> Option<Self> {
        let address = listen.tcp.clone()?;
        let batching = listen.batching.enabled.then(|| BatchSettings {
            batch_size: listen.batching.batch_size.max(1),
            flush_interval: listen.batching.flush_interval,
        });

        Some(Self {
            address,
            idle_timeout: listen.incoming_conn_idle_timeout,
            max_line_len: listen.max_line_len,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            batching,
        })
    }

    /// Listener type for metrics
    pub fn source_type(&self) -> &'static str {
        if self.batching.is_some() {
            "tcp_batch"
        } else {
            "tcp"
        }
    }
}

/// Bound TCP line listener
pub struct TcpLineListener {
    config: Arc<TcpListenerConfig>,
    listener: TcpListener,
    local_addr: SocketAddr,
    sender: MainSender,
    metrics: Arc<SourceMetrics>,
    sampler: Arc<LogSampler>,
}

impl TcpLineListener {
    /// Bind the listen address
    pub async fn bind(config: TcpListenerConfig, sender: MainSender) -> Result<Self> {
        let listener = TcpListener::bind(&config.address)
            .await
            .map_err(|e| SourceError::bind(&config.address, e))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config: Arc::new(config),
            listener,
            local_addr,
            sender,
            metrics: Arc::new(SourceMetrics::new()),
            sampler: Arc::new(LogSampler::default()),
        })
    }

    /// Override the minimum gap between repeated error logs
    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sampler = Arc::new(LogSampler::new(interval));
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
            source_type: self.config.source_type(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Accept connections until cancelled, then wait for all readers
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let tracker = TaskTracker::new();

        tracing::info!(
            address = %self.local_addr,
            mode = self.config.source_type(),
            max_line_len = self.config.max_line_len,
            "tcp listener started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        configure_socket(&stream);
                        self.metrics.connection_opened();

                        let reader = ConnectionReader {
                            config: Arc::clone(&self.config),
                            sender: self.sender.clone(),
                            metrics: Arc::clone(&self.metrics),
                            sampler: Arc::clone(&self.sampler),
                            cancel: cancel.clone(),
                            peer,
                        };
                        tracker.spawn(reader.run(stream));
                    }
                    Err(e) => {
                        self.metrics.record_error();
                        if let Some(suppressed) = self.sampler.sample() {
                            tracing::warn!(error = %e, suppressed, "tcp accept error");
                        }
                    }
                },
            }
        }

        // Stop accepting before waiting on readers
        drop(self.listener);
        tracker.close();
        tracker.wait().await;

        tracing::info!(address = %self.local_addr, "tcp listener stopped");
        Ok(())
    }
}

/// Keep-alive on accepted sockets; failures are logged and ignored
fn configure_socket(stream: &TcpStream) {
    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE);
    if let Err(e) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
        tracing::debug!(error = %e, "failed to set TCP keep-alive on ingress connection");
    }
}

/// Why a reader loop ended
enum Exit {
    Eof,
    Idle,
    Cancelled,
    QueueClosed,
    Error(std::io::Error),
}

/// Reads one accepted connection
struct ConnectionReader {
    config: Arc<TcpListenerConfig>,
    sender: MainSender,
    metrics: Arc<SourceMetrics>,
    sampler: Arc<LogSampler>,
    cancel: CancellationToken,
    peer: SocketAddr,
}

impl ConnectionReader {
    async fn run(self, stream: TcpStream) {
        let mut reader = BufReader::with_capacity(self.config.read_buffer_size, stream);

        let exit = match self.config.batching {
            Some(settings) => self.read_batches(&mut reader, settings).await,
            None => self.read_lines(&mut reader).await,
        };

        match exit {
            Exit::Idle => tracing::debug!(peer = %self.peer, "closing idle connection"),
            Exit::Error(e) => {
                if !is_connection_reset(&e) {
                    self.metrics.record_error();
                    if let Some(suppressed) = self.sampler.sample() {
                        tracing::warn!(peer = %self.peer, error = %e, suppressed, "tcp read error");
                    }
                }
            }
            Exit::Eof | Exit::Cancelled | Exit::QueueClosed => {}
        }

        self.metrics.connection_closed();
    }

    /// Deadline for the next line, far away when idle timeout is off
    fn next_deadline(&self) -> Instant {
        if self.config.idle_timeout.is_zero() {
            Instant::now() + Duration::from_secs(86_400 * 365)
        } else {
            Instant::now() + self.config.idle_timeout
        }
    }

    /// Line mode: one push per line
    async fn read_lines(&self, reader: &mut BufReader<TcpStream>) -> Exit {
        let mut buf = BytesMut::with_capacity(self.config.max_line_len.min(64 * 1024));
        let mut deadline = self.next_deadline();

        loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.drain_buffered(reader, &mut buf, |line| {
                        self.sender.push(Payload::Line(line), &self.metrics) != Push::Closed
                    });
                    return Exit::Cancelled;
                }
                _ = sleep_until(deadline) => return Exit::Idle,
                read = read_bounded_line(reader, &mut buf, self.config.max_line_len) => read,
            };

            match read {
                Ok(ReadLine::Line(line)) => {
                    deadline = self.next_deadline();
                    if line.is_empty() {
                        continue;
                    }
                    self.metrics.record_bytes(line.len() as u64 + 1);
                    if self.sender.push(Payload::Line(line), &self.metrics) == Push::Closed {
                        return Exit::QueueClosed;
                    }
                }
                Ok(ReadLine::TooLong) => {
                    deadline = self.next_deadline();
                    self.metrics.record_oversized();
                    tracing::debug!(
                        peer = %self.peer,
                        max = self.config.max_line_len,
                        "line too long, dropped"
                    );
                }
                Ok(ReadLine::Eof) => return Exit::Eof,
                Err(e) => return Exit::Error(e),
            }
        }
    }

    /// Batched mode: one push per batch
    async fn read_batches(&self, reader: &mut BufReader<TcpStream>, settings: BatchSettings) -> Exit {
        let mut buf = BytesMut::with_capacity(self.config.max_line_len.min(64 * 1024));
        let mut batch = LineBatch::new(settings.batch_size);
        let mut deadline = self.next_deadline();

        let mut flush_tick = interval(settings.flush_interval.max(Duration::from_millis(1)));
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let exit = loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.drain_buffered(reader, &mut buf, |line| {
                        !batch.push(line) || self.flush(&mut batch)
                    });
                    break Exit::Cancelled;
                }
                _ = sleep_until(deadline) => break Exit::Idle,
                _ = flush_tick.tick() => {
                    if !self.flush(&mut batch) {
                        break Exit::QueueClosed;
                    }
                    continue;
                }
                read = read_bounded_line(reader, &mut buf, self.config.max_line_len) => read,
            };

            match read {
                Ok(ReadLine::Line(line)) => {
                    deadline = self.next_deadline();
                    if line.is_empty() {
                        continue;
                    }
                    self.metrics.record_bytes(line.len() as u64 + 1);
                    if batch.push(line) && !self.flush(&mut batch) {
                        break Exit::QueueClosed;
                    }
                }
                Ok(ReadLine::TooLong) => {
                    deadline = self.next_deadline();
                    self.metrics.record_oversized();
                }
                Ok(ReadLine::Eof) => break Exit::Eof,
                Err(e) => break Exit::Error(e),
            }
        };

        // Hand over what this connection already read
        self.flush(&mut batch);
        exit
    }

    /// Deliver complete lines already in the read buffer
    ///
    /// `deliver` returns false once the queue is closed.
    fn drain_buffered(
        &self,
        reader: &mut BufReader<TcpStream>,
        buf: &mut BytesMut,
        mut deliver: impl FnMut(Bytes) -> bool,
    ) {
        let mut drained = 0usize;
        while let Some(read) = take_buffered_line(reader, buf, self.config.max_line_len) {
            match read {
                ReadLine::Line(line) if line.is_empty() => {}
                ReadLine::Line(line) => {
                    self.metrics.record_bytes(line.len() as u64 + 1);
                    drained += 1;
                    if !deliver(line) {
                        break;
                    }
                }
                ReadLine::TooLong => self.metrics.record_oversized(),
                ReadLine::Eof => break,
            }
        }
        if drained > 0 {
            tracing::debug!(peer = %self.peer, lines = drained, "drained buffered lines on shutdown");
        }
    }

    /// Push the pending batch; false once the queue is closed
    fn flush(&self, batch: &mut LineBatch) -> bool {
        if batch.is_empty() {
            return true;
        }
        self.sender.push(batch.take(), &self.metrics) != Push::Closed
    }
}
