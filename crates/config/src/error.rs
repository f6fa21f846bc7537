//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A rule targets a cluster that is not declared
    #[error("rule {rule} references unknown cluster '{cluster}'")]
    UnknownCluster {
        /// Position of the rule in the rules file
        rule: usize,
        /// Name of the missing cluster
        cluster: String,
    },

    /// Two clusters share a name
    #[error("cluster '{0}' is declared more than once")]
    DuplicateCluster(String),

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "cluster", "rule")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// pprof and metrics endpoints configured on the same port
    #[error("pprof_port and prom_port must differ (both set to {0})")]
    PortConflict(u16),

    /// Neither a TCP nor a UDP listen address is set
    #[error("no listeners configured - at least one of listen.tcp or listen.udp must be set")]
    NoListenersEnabled,
}

impl ConfigError {
    /// Create an UnknownCluster error
    pub fn unknown_cluster(rule: usize, cluster: impl Into<String>) -> Self {
        Self::UnknownCluster {
            rule,
            cluster: cluster.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}

/// Read a whole config file, mapping IO failures to [`ConfigError::IoError`]
pub(crate) fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })
}
