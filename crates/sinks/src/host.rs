//! Downstream hosts
//!
//! A [`Host`] is the producer side of one downstream server: workers push
//! records into it without ever blocking. Behind it sit one or more
//! [`HostStreamer`]s, one per sub-connection (`mtcp`), each owning a bounded
//! queue and a single connection.
//!
//! # Delivery
//!
//! ```text
//! worker ──try_send──▶ [queue 0] ──▶ HostStreamer 0 ──▶ TCP / gRPC
//!        (round-robin) [queue 1] ──▶ HostStreamer 1 ──▶ TCP / gRPC
//! ```
//!
//! A streamer retries the record at hand until it is written: dial failures
//! back off with jitter, write failures drop the connection and redial. When
//! its queue is closed it drains what is left, flushes and exits.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossfire::{MAsyncRx, MAsyncTx, TrySendError};
use relay_config::SenderConfig;
use relay_metrics::{DEFAULT_SAMPLE_INTERVAL, LogSampler};
use relay_protocol::Record;
use tokio::time::{MissedTickBehavior, interval, sleep, timeout};

use crate::backoff::{Backoff, BackoffConfig};
use crate::error::HostError;
use crate::link::Link;
use crate::metrics::{HostMetrics, HostMetricsHandle};

/// Sender tuning shared by every host
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Capacity of each sub-connection queue
    pub queue_size: usize,
    pub default_port: u16,
    /// Upper bound for one record write
    pub send_timeout: Duration,
    pub connect_timeout: Duration,
    /// Outgoing buffer; 0 writes straight through
    pub buffer_size: usize,
    /// Periodic flush of the outgoing buffer; 0 disables
    pub flush_period: Duration,
    /// Reconnect connections left unused for longer than this; 0 disables
    pub refresh_period: Duration,
    /// TCP keep-alive; 0 disables
    pub keepalive: Duration,
    pub backoff: BackoffConfig,
    /// Dial every connection at startup instead of on the first record
    pub initial_conn_check: bool,
    /// Minimum gap between repeated error logs
    pub sample_interval: Duration,
}

impl HostOptions {
    pub fn from_config(config: &SenderConfig, queue_size: usize) -> Self {
        Self {
            queue_size: queue_size.max(1),
            default_port: config.default_port,
            send_timeout: config.send_timeout,
            connect_timeout: config.out_conn_timeout,
            buffer_size: config.tcp_out_buf_size,
            flush_period: config.tcp_out_buf_flush_period,
            refresh_period: config.connection_refresh_period,
            keepalive: config.keepalive,
            backoff: BackoffConfig::from(config),
            initial_conn_check: config.initial_conn_check,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }
}

impl Default for HostOptions {
    fn default() -> Self {
        Self::from_config(&SenderConfig::default(), 1_000)
    }
}

/// Wire protocol spoken to a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Graphite plaintext lines over TCP
    Plain,
    /// `relay.Relay/Stream` client-streaming calls
    Grpc,
}

/// Where a host lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl Endpoint {
    pub fn plain(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            protocol: Protocol::Plain,
        }
    }

    pub fn grpc(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            protocol: Protocol::Grpc,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

/// State shared between a host, its streamers and its metrics handle
pub(crate) struct HostShared {
    id: String,
    cluster: String,
    available: AtomicBool,
    metrics: HostMetrics,
    write_sampler: LogSampler,
    dial_sampler: LogSampler,
}

impl HostShared {
    fn new(id: String, cluster: String, sample_interval: Duration, available: bool) -> Self {
        Self {
            id,
            cluster,
            available: AtomicBool::new(available),
            metrics: HostMetrics::new(),
            write_sampler: LogSampler::new(sample_interval),
            dial_sampler: LogSampler::new(sample_interval),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub(crate) fn cluster(&self) -> &str {
        &self.cluster
    }

    #[inline]
    pub(crate) fn metrics(&self) -> &HostMetrics {
        &self.metrics
    }

    #[inline]
    pub(crate) fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn mark_available(&self) {
        if !self.available.swap(true, Ordering::Relaxed) {
            self.metrics.record_state_change();
            tracing::info!(host = %self.id, cluster = %self.cluster, "host available");
        }
    }

    fn mark_unavailable(&self) {
        if self.available.swap(false, Ordering::Relaxed) {
            self.metrics.record_state_change();
            tracing::warn!(host = %self.id, cluster = %self.cluster, "host unavailable");
        }
    }
}

/// Producer side of one downstream host
pub struct Host {
    shared: Arc<HostShared>,
    senders: Vec<MAsyncTx<Arc<Record>>>,
    next: AtomicUsize,
}

impl Host {
    /// Create a host with `connections` sub-connections
    ///
    /// Returns the host and one streamer per sub-connection; the caller
    /// spawns the streamers.
    pub fn new(
        cluster: impl Into<String>,
        endpoint: Endpoint,
        connections: usize,
        options: Arc<HostOptions>,
    ) -> (Self, Vec<HostStreamer>) {
        let connections = connections.max(1);
        let shared = Arc::new(HostShared::new(
            endpoint.to_string(),
            cluster.into(),
            options.sample_interval,
            // Checked hosts wait for their first dial; the rest start optimistic
            !options.initial_conn_check,
        ));

        let mut senders = Vec::with_capacity(connections);
        let mut streamers = Vec::with_capacity(connections);
        for index in 0..connections {
            // mpmc handles are Sync, which keeps `HostStreamer::run` Send
            let (tx, rx) = crossfire::mpmc::bounded_async::<Arc<Record>>(options.queue_size);
            senders.push(tx);
            streamers.push(HostStreamer {
                shared: Arc::clone(&shared),
                endpoint: endpoint.clone(),
                index,
                options: Arc::clone(&options),
                receiver: rx,
            });
        }

        let host = Self {
            shared,
            senders,
            next: AtomicUsize::new(0),
        };
        (host, streamers)
    }

    /// `name:port`
    #[inline]
    pub fn id(&self) -> &str {
        self.shared.id()
    }

    #[inline]
    pub fn cluster(&self) -> &str {
        self.shared.cluster()
    }

    /// Whether the host's last dial succeeded
    #[inline]
    pub fn is_available(&self) -> bool {
        self.shared.is_available()
    }

    /// Number of sub-connections
    #[inline]
    pub fn connections(&self) -> usize {
        self.senders.len()
    }

    /// Queue a record without blocking
    ///
    /// Sub-connections take turns. Returns false when the chosen queue is
    /// full or closed; the record is dropped and counted.
    pub fn push(&self, record: Arc<Record>) -> bool {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        match self.senders[slot].try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.shared.metrics.record_throttled();
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_available(&self, available: bool) {
        if available {
            self.shared.mark_available();
        } else {
            self.shared.mark_unavailable();
        }
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle implements `HostMetricsProvider` and remains valid after
    /// the host is dropped.
    pub fn metrics_handle(&self) -> HostMetricsHandle {
        HostMetricsHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.shared.id)
            .field("cluster", &self.shared.cluster)
            .field("connections", &self.senders.len())
            .finish()
    }
}

/// Open connection plus when it last carried data
struct Connection {
    link: Link,
    last_used: Instant,
}

/// Consumer side of one sub-connection
pub struct HostStreamer {
    shared: Arc<HostShared>,
    endpoint: Endpoint,
    index: usize,
    options: Arc<HostOptions>,
    receiver: MAsyncRx<Arc<Record>>,
}

impl fmt::Debug for HostStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostStreamer")
            .field("host", &self.shared.id)
            .field("conn", &self.index)
            .field("protocol", &self.endpoint.protocol)
            .finish()
    }
}

impl HostStreamer {
    /// `name:port`
    #[inline]
    pub fn host_id(&self) -> &str {
        self.shared.id()
    }

    /// Sub-connection index within the host
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Deliver queued records until every sender is dropped and the queue
    /// is empty
    pub async fn run(self) {
        let mut conn: Option<Connection> = None;
        let mut backoff = Backoff::new(self.options.backoff);
        let mut scratch = Vec::with_capacity(256);

        tracing::debug!(
            host = %self.shared.id,
            conn = self.index,
            "host streamer starting"
        );

        if self.options.initial_conn_check {
            self.try_dial(&mut conn, &mut backoff).await;
        }

        let flushing = self.endpoint.protocol == Protocol::Plain
            && self.options.buffer_size > 0
            && !self.options.flush_period.is_zero();
        let mut flush_tick = interval(self.options.flush_period.max(Duration::from_millis(1)));
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                received = self.receiver.recv() => match received {
                    Ok(record) => self.send(&record, &mut conn, &mut backoff, &mut scratch).await,
                    Err(_) => break,
                },

                _ = flush_tick.tick(), if flushing => self.flush(&mut conn).await,
            }
        }

        if let Some(open) = conn.take()
            && let Err(e) = open.link.shutdown().await
        {
            self.shared.metrics.record_flush_error();
            tracing::warn!(
                host = %self.shared.id,
                conn = self.index,
                error = %e,
                "final flush failed"
            );
        }

        tracing::debug!(
            host = %self.shared.id,
            conn = self.index,
            "host streamer drained"
        );
    }

    /// Write one record, reconnecting as often as it takes
    async fn send(
        &self,
        record: &Record,
        conn: &mut Option<Connection>,
        backoff: &mut Backoff,
        scratch: &mut Vec<u8>,
    ) {
        loop {
            self.refresh_if_stale(conn).await;

            let open = match conn {
                Some(open) => open,
                None => {
                    let wait = backoff.delay();
                    if !wait.is_zero() {
                        sleep(wait).await;
                    }
                    self.try_dial(conn, backoff).await;
                    continue;
                }
            };

            let result = match timeout(
                self.options.send_timeout,
                open.link.write(record, scratch),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(HostError::WriteTimeout(self.options.send_timeout)),
            };

            match result {
                Ok(()) => {
                    open.last_used = Instant::now();
                    self.shared.metrics.record_out(record.received_at().elapsed());
                    return;
                }
                Err(e) => {
                    self.shared.metrics.record_write_error();
                    if let Some(suppressed) = self.shared.write_sampler.sample() {
                        tracing::warn!(
                            host = %self.shared.id,
                            conn = self.index,
                            error = %e,
                            suppressed,
                            "write failed, reconnecting"
                        );
                    }
                    *conn = None;
                }
            }
        }
    }

    /// One dial attempt; updates availability and backoff
    async fn try_dial(&self, conn: &mut Option<Connection>, backoff: &mut Backoff) {
        match Link::dial(&self.endpoint, &self.options).await {
            Ok(link) => {
                backoff.success();
                self.shared.metrics.record_reconnect();
                self.shared.mark_available();
                tracing::debug!(
                    host = %self.shared.id,
                    conn = self.index,
                    "connected"
                );
                *conn = Some(Connection {
                    link,
                    last_used: Instant::now(),
                });
            }
            Err(e) => {
                backoff.failure();
                self.shared.metrics.record_dial_error();
                self.shared.mark_unavailable();
                if let Some(suppressed) = self.shared.dial_sampler.sample() {
                    tracing::warn!(
                        host = %self.shared.id,
                        conn = self.index,
                        error = %e,
                        retry_in = ?backoff.current(),
                        suppressed,
                        "dial failed"
                    );
                }
            }
        }
    }

    /// Close a connection idle for longer than the refresh period
    async fn refresh_if_stale(&self, conn: &mut Option<Connection>) {
        let period = self.options.refresh_period;
        if period.is_zero() {
            return;
        }
        let stale = conn
            .as_ref()
            .is_some_and(|open| open.last_used.elapsed() >= period);
        if !stale {
            return;
        }

        if let Some(open) = conn.take() {
            self.shared.metrics.record_refresh();
            if let Err(e) = open.link.shutdown().await {
                tracing::debug!(
                    host = %self.shared.id,
                    conn = self.index,
                    error = %e,
                    "closing stale connection failed"
                );
            }
        }
    }

    async fn flush(&self, conn: &mut Option<Connection>) {
        let Some(open) = conn.as_mut() else {
            return;
        };

        let result = match timeout(self.options.send_timeout, open.link.flush()).await {
            Ok(result) => result,
            Err(_) => Err(HostError::WriteTimeout(self.options.send_timeout)),
        };

        if let Err(e) = result {
            self.shared.metrics.record_flush_error();
            if let Some(suppressed) = self.shared.write_sampler.sample() {
                tracing::warn!(
                    host = %self.shared.id,
                    conn = self.index,
                    error = %e,
                    suppressed,
                    "flush failed, reconnecting"
                );
            }
            *conn = None;
        }
    }
}
