//! Routing error types

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while compiling the rule engine
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Rule targets a cluster that is not in the cluster set
    #[error("rule {rule} references unknown cluster '{name}'")]
    UnknownCluster {
        /// Position of the rule
        rule: usize,
        /// Name of the missing cluster
        name: String,
    },

    /// Rule pattern does not compile
    #[error("rule {rule}: invalid regex '{pattern}': {source}")]
    InvalidRegex {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rule has no regex and no prefix
    #[error("rule {rule} has nothing to match on")]
    EmptyMatch {
        rule: usize,
    },

    /// Rule has no target clusters
    #[error("rule {rule} has no target clusters")]
    EmptyTargets {
        rule: usize,
    },

    /// More clusters than a `ClusterId` can address
    #[error("too many clusters: {0} (max {max})", max = crate::ClusterId::MAX)]
    TooManyClusters(usize),
}

impl RoutingError {
    /// Create an UnknownCluster error
    #[inline]
    pub fn unknown_cluster(rule: usize, name: impl Into<String>) -> Self {
        Self::UnknownCluster {
            rule,
            name: name.into(),
        }
    }

    /// Create an InvalidRegex error
    #[inline]
    pub fn invalid_regex(rule: usize, pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            rule,
            pattern: pattern.into(),
            source,
        }
    }
}
