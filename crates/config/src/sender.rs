//! Egress sender configuration
//!
//! Timeouts, buffering and reconnection behavior shared by every host.
//! A duration of `"0s"` disables the periodic features (flush ticker,
//! connection refresh, keepalive).

use serde::Deserialize;
use std::time::Duration;

/// Host sender settings
///
/// # Example
///
/// ```toml
/// [sender]
/// default_port = 2003
/// send_timeout = "5s"
/// out_conn_timeout = "5s"
/// tcp_out_buf_size = 4096
/// tcp_out_buf_flush_period = "2s"
/// connection_refresh_period = "0s"
/// max_reconnect_period = "5s"
/// reconnect_period_delta = "10ms"
/// connection_jitter = true
/// min_jitter_amplitude = "100ms"
/// initial_conn_check = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Port used for hosts without an explicit one
    /// Default: 2003
    pub default_port: u16,

    /// Deadline for writing one record
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,

    /// Deadline for dialing a host
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub out_conn_timeout: Duration,

    /// Write buffer size per connection in bytes, 0 = unbuffered
    /// Default: 4096
    pub tcp_out_buf_size: usize,

    /// Period of the buffer flush ticker, 0 disables
    /// Default: 2s
    #[serde(with = "humantime_serde")]
    pub tcp_out_buf_flush_period: Duration,

    /// Re-dial connections unused for longer than this, 0 disables
    /// Default: 0s
    #[serde(with = "humantime_serde")]
    pub connection_refresh_period: Duration,

    /// TCP keepalive period, 0 disables
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,

    /// Ceiling for the reconnect backoff
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub max_reconnect_period: Duration,

    /// Added to the doubled backoff after each failed dial
    /// Default: 10ms
    #[serde(with = "humantime_serde")]
    pub reconnect_period_delta: Duration,

    /// Randomize reconnect waits
    /// Default: true
    pub connection_jitter: bool,

    /// Lower bound of the jitter amplitude
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub min_jitter_amplitude: Duration,

    /// Hosts start unavailable until their first successful dial
    /// Default: false
    pub initial_conn_check: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            default_port: 2003,
            send_timeout: Duration::from_secs(5),
            out_conn_timeout: Duration::from_secs(5),
            tcp_out_buf_size: 4096,
            tcp_out_buf_flush_period: Duration::from_secs(2),
            connection_refresh_period: Duration::ZERO,
            keepalive: Duration::from_secs(30),
            max_reconnect_period: Duration::from_secs(5),
            reconnect_period_delta: Duration::from_millis(10),
            connection_jitter: true,
            min_jitter_amplitude: Duration::from_millis(100),
            initial_conn_check: false,
        }
    }
}
