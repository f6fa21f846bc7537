//! Tests for parse error types

use crate::error::ParseError;

#[test]
fn test_error_creation_invalid_value() {
    let err = ParseError::invalid_value(b"abc");
    assert_eq!(err, ParseError::InvalidValue("abc".into()));
}

#[test]
fn test_error_creation_invalid_timestamp_lossy() {
    let err = ParseError::invalid_timestamp(b"\xff1");
    assert!(matches!(err, ParseError::InvalidTimestamp(s) if s.ends_with('1')));
}

#[test]
fn test_error_display() {
    assert_eq!(ParseError::FieldCount(2).to_string(), "expected 3 fields, got 2");
    assert_eq!(ParseError::EmptyPath.to_string(), "empty path");
    assert!(ParseError::invalid_value(b"x").to_string().contains("\"x\""));
}

#[test]
fn test_error_kind() {
    assert_eq!(ParseError::FieldCount(0).kind(), "field_count");
    assert_eq!(ParseError::EmptyPath.kind(), "empty_path");
    assert_eq!(ParseError::InvalidUtf8.kind(), "invalid_utf8");
    assert_eq!(ParseError::invalid_timestamp(b"x").kind(), "invalid_timestamp");
}
