//! Relay Configuration
//!
//! TOML-based configuration loading with sensible defaults. The relay reads
//! up to four documents:
//!
//! - main config (`Config`): listeners, queues, sender tuning, logging, metrics
//! - clusters (`ClustersConfig`): downstream clusters and their hosts
//! - rules (`RulesConfig`): ordered match-and-route rules
//! - rewrites (`RewritesConfig`, optional): path rewrite rules
//!
//! Each document is validated on its own when parsed; cross-document checks
//! (rules targeting declared clusters) go through [`validate_rules_against`].
//!
//! # Parsing
//!
//! ```
//! use relay_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[listen]\ntcp = \"0.0.0.0:2003\"").unwrap();
//! assert_eq!(config.sender.default_port, 2003);
//! ```

mod clusters;
mod error;
mod global;
mod listen;
mod logging;
mod metrics;
mod rewrites;
mod rules;
mod sender;
mod validation;

use std::path::Path;
use std::str::FromStr;

pub use clusters::{ClusterConfig, ClusterType, ClustersConfig, HostConfig};
pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use listen::{BatchingConfig, ListenConfig};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use rewrites::{RewriteConfig, RewritesConfig};
pub use rules::{RuleConfig, RulesConfig};
pub use sender::SenderConfig;
pub use validation::validate_rules_against;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, but at least one of
/// `listen.tcp` / `listen.udp` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (queues, workers, shutdown)
    pub global: GlobalConfig,

    /// Ingress listeners
    pub listen: ListenConfig,

    /// Egress host sender tuning
    pub sender: SenderConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&error::read_file(path.as_ref())?)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Names of the configured listeners
    pub fn enabled_listeners(&self) -> Vec<&'static str> {
        let mut listeners = Vec::new();
        if self.listen.tcp.is_some() {
            listeners.push(if self.listen.batching.enabled {
                "tcp_batch"
            } else {
                "tcp"
            });
        }
        if self.listen.udp.is_some() {
            listeners.push("udp");
        }
        if self.listen.grpc.is_some() {
            listeners.push("grpc");
        }
        listeners
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
