//! Metrics reporting configuration
//!
//! Controls the periodic counter summary written to the log.
//!
//! # Defaults
//!
//! - `enabled`: true
//! - `interval`: 60s
//! - `format`: human
//! - All include flags: true

use serde::Deserialize;
use std::time::Duration;

/// Metrics output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON structured output
    Json,
}

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "60s"
/// format = "human"
/// include_listeners = true
/// include_hosts = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics reporting
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Output format (human, json)
    /// Default: human
    pub format: MetricsFormat,

    /// Include per-listener counters
    /// Default: true
    pub include_listeners: bool,

    /// Include per-host counters and latency percentiles
    /// Default: true
    pub include_hosts: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::Human,
            include_listeners: true,
            include_hosts: true,
        }
    }
}
