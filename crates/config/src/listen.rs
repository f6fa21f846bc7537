//! Ingress listener configuration
//!
//! ```toml
//! [listen]
//! tcp = "0.0.0.0:2003"
//! udp = "0.0.0.0:2003"
//! grpc = "0.0.0.0:2004"
//! incoming_conn_idle_timeout = "90s"
//!
//! [listen.batching]
//! enabled = true
//! batch_size = 100
//! flush_interval = "100ms"
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Listener addresses and per-connection limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// TCP line listener address (e.g., "0.0.0.0:2003")
    pub tcp: Option<String>,

    /// UDP datagram listener address
    pub udp: Option<String>,

    /// Streaming RPC listener address
    pub grpc: Option<String>,

    /// Close an ingress TCP connection after this long without a line
    /// Default: 90s
    #[serde(with = "humantime_serde")]
    pub incoming_conn_idle_timeout: Duration,

    /// Longest accepted line in bytes; longer lines are dropped
    /// Default: 4096
    pub max_line_len: usize,

    /// SO_RCVBUF for the UDP socket, 0 keeps the OS default
    pub udp_os_buffer_size: usize,

    /// Batched TCP listener settings
    pub batching: BatchingConfig,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            tcp: None,
            udp: None,
            grpc: None,
            incoming_conn_idle_timeout: Duration::from_secs(90),
            max_line_len: 4096,
            udp_os_buffer_size: 0,
            batching: BatchingConfig::default(),
        }
    }
}

/// Batched TCP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Push line batches instead of single lines
    /// Default: false
    pub enabled: bool,

    /// Lines per batch
    /// Default: 100
    pub batch_size: usize,

    /// Flush a partial batch after this long
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_size: 100,
            flush_interval: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListenConfig::default();
        assert!(config.tcp.is_none());
        assert!(config.udp.is_none());
        assert!(config.grpc.is_none());
        assert_eq!(config.incoming_conn_idle_timeout, Duration::from_secs(90));
        assert!(!config.batching.enabled);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
tcp = "127.0.0.1:2003"
udp = "127.0.0.1:2003"
grpc = "127.0.0.1:2004"
incoming_conn_idle_timeout = "5s"
max_line_len = 1024
udp_os_buffer_size = 8388608

[batching]
enabled = true
batch_size = 10
flush_interval = "50ms"
"#;
        let config: ListenConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tcp.as_deref(), Some("127.0.0.1:2003"));
        assert_eq!(config.udp.as_deref(), Some("127.0.0.1:2003"));
        assert_eq!(config.grpc.as_deref(), Some("127.0.0.1:2004"));
        assert_eq!(config.incoming_conn_idle_timeout, Duration::from_secs(5));
        assert_eq!(config.max_line_len, 1024);
        assert_eq!(config.udp_os_buffer_size, 8388608);
        assert!(config.batching.enabled);
        assert_eq!(config.batching.batch_size, 10);
        assert_eq!(config.batching.flush_interval, Duration::from_millis(50));
    }
}
