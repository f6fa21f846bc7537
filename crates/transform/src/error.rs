//! Rewrite error types
//!
//! Errors raised while compiling rewrite rules. Applying compiled rules
//! cannot fail.

use thiserror::Error;

/// Errors that can occur while building a [`Rewriter`](crate::Rewriter)
#[derive(Debug, Error)]
pub enum RewriteError {
    /// `from` pattern does not compile
    #[error("rewrite {index}: invalid regex '{pattern}': {source}")]
    InvalidRegex {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Required field absent
    #[error("rewrite {index}: missing '{field}'")]
    MissingField { index: usize, field: &'static str },
}

impl RewriteError {
    /// Create an invalid regex error
    pub fn invalid_regex(index: usize, pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            index,
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a missing field error
    pub fn missing_field(index: usize, field: &'static str) -> Self {
        Self::MissingField { index, field }
    }
}
