//! Parse error types
//!
//! Errors raised while turning a raw Graphite line into a [`Record`](crate::Record).
//! They never leave the worker: callers count them and drop the line.

use thiserror::Error;

/// Errors that can occur while parsing a Graphite line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Line does not split into exactly `path value time`
    #[error("expected 3 fields, got {0}")]
    FieldCount(usize),

    /// Value field is not a float
    #[error("invalid value: {0:?}")]
    InvalidValue(String),

    /// Time field is neither a u32 nor a finite in-range float
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Path is empty, or became empty after normalization
    #[error("empty path")]
    EmptyPath,

    /// Path is not valid UTF-8 and normalization is disabled
    #[error("path is not valid utf-8")]
    InvalidUtf8,
}

impl ParseError {
    /// Create an invalid value error from the raw field bytes
    #[inline]
    pub fn invalid_value(raw: &[u8]) -> Self {
        Self::InvalidValue(String::from_utf8_lossy(raw).into_owned())
    }

    /// Create an invalid timestamp error from the raw field bytes
    #[inline]
    pub fn invalid_timestamp(raw: &[u8]) -> Self {
        Self::InvalidTimestamp(String::from_utf8_lossy(raw).into_owned())
    }

    /// Short, stable label used in sampled log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldCount(_) => "field_count",
            Self::InvalidValue(_) => "invalid_value",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::EmptyPath => "empty_path",
            Self::InvalidUtf8 => "invalid_utf8",
        }
    }
}
