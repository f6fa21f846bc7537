//! Tests for Record parsing and serialization

use std::time::Instant;

use bytes::Bytes;

use crate::error::ParseError;
use crate::record::Record;

fn parse(line: &str) -> Result<Record, ParseError> {
    Record::parse(&Bytes::copy_from_slice(line.as_bytes()), true, Instant::now())
}

fn parse_raw(line: &str) -> Result<Record, ParseError> {
    Record::parse(&Bytes::copy_from_slice(line.as_bytes()), false, Instant::now())
}

// =============================================================================
// Tokenization
// =============================================================================

#[test]
fn test_parse_basic() {
    let rec = parse("a.b.c 1.5 1600000000").unwrap();

    assert_eq!(rec.path(), "a.b.c");
    assert_eq!(rec.value(), 1.5);
    assert_eq!(rec.time(), 1600000000);
    assert_eq!(rec.raw_value(), b"1.5");
    assert_eq!(rec.raw_time(), b"1600000000");
    assert!(rec.tag().is_empty());
    assert!(!rec.has_fractional_time());
}

#[test]
fn test_parse_trailing_newline() {
    let rec = parse("a.b 1 2\n").unwrap();
    assert_eq!(rec.path(), "a.b");
    assert_eq!(rec.time(), 2);

    let rec = parse("a.b 1 2\r\n").unwrap();
    assert_eq!(rec.raw_time(), b"2");
}

#[test]
fn test_parse_whitespace_runs_are_equivalent() {
    let a = parse("a.b 1 2").unwrap();
    let b = parse("  a.b\t\t 1 \x0b\x0c 2  ").unwrap();

    assert_eq!(a.serialize(), b.serialize());
}

#[test]
fn test_parse_leading_space_tolerated() {
    let rec = parse(" ab.c 123 123").unwrap();
    assert_eq!(rec.path(), "ab.c");
}

#[test]
fn test_parse_field_count() {
    assert_eq!(parse("").unwrap_err(), ParseError::FieldCount(0));
    assert_eq!(parse("   ").unwrap_err(), ParseError::FieldCount(0));
    assert_eq!(parse("a.b 1").unwrap_err(), ParseError::FieldCount(2));
    assert_eq!(parse("a.b 1 2 3").unwrap_err(), ParseError::FieldCount(4));
}

// =============================================================================
// Value and timestamp
// =============================================================================

#[test]
fn test_parse_invalid_value() {
    let err = parse("a.b abc 1").unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue(v) if v == "abc"));
}

#[test]
fn test_parse_value_keeps_raw_precision() {
    let rec = parse("a 1.000000000000000001 5").unwrap();
    assert_eq!(rec.raw_value(), b"1.000000000000000001");
    assert_eq!(rec.serialize(), b"a 1.000000000000000001 5\n");
}

#[test]
fn test_parse_invalid_timestamp() {
    assert!(matches!(
        parse("a.b 1 notatime").unwrap_err(),
        ParseError::InvalidTimestamp(_)
    ));
    assert!(matches!(
        parse("a.b 1 -5").unwrap_err(),
        ParseError::InvalidTimestamp(_)
    ));
    assert!(matches!(
        parse("a.b 1 99999999999").unwrap_err(),
        ParseError::InvalidTimestamp(_)
    ));
    assert!(matches!(
        parse("a.b 1 inf").unwrap_err(),
        ParseError::InvalidTimestamp(_)
    ));
}

#[test]
fn test_parse_fractional_timestamp_truncates() {
    let rec = parse("a.b 1 123.45").unwrap();

    assert_eq!(rec.time(), 123);
    assert!(rec.has_fractional_time());
    // Raw text survives for the wire
    assert_eq!(rec.raw_time(), b"123.45");
}

// =============================================================================
// Path handling
// =============================================================================

#[test]
fn test_parse_normalizes_path() {
    let rec = parse("..a..b/c. 1 2").unwrap();
    assert_eq!(rec.path(), "a.b_c");
}

#[test]
fn test_parse_dots_only_rejected() {
    assert_eq!(parse("... 1 2").unwrap_err(), ParseError::EmptyPath);
}

#[test]
fn test_parse_tag_kept_verbatim() {
    let rec = parse("a..b;env=prod;dc=x/y 1 2").unwrap();

    assert_eq!(rec.path(), "a.b");
    assert_eq!(rec.tag(), b";env=prod;dc=x/y");
    assert_eq!(rec.serialize(), b"a.b;env=prod;dc=x/y 1 2\n");
    assert_eq!(rec.full_path(), "a.b;env=prod;dc=x/y");
}

#[test]
fn test_parse_tag_only_rejected() {
    assert_eq!(parse(";env=prod 1 2").unwrap_err(), ParseError::EmptyPath);
}

#[test]
fn test_parse_without_normalization() {
    let rec = parse_raw("..a b..c").unwrap_err();
    assert_eq!(rec, ParseError::FieldCount(2));

    let rec = parse_raw("..a/b 1 2").unwrap();
    assert_eq!(rec.path(), "..a/b");
}

#[test]
fn test_parse_without_normalization_rejects_bad_utf8() {
    let line = Bytes::from_static(b"a\xffb 1 2");
    let err = Record::parse(&line, false, Instant::now()).unwrap_err();
    assert_eq!(err, ParseError::InvalidUtf8);

    // Normalization replaces the byte instead
    let rec = Record::parse(&line, true, Instant::now()).unwrap();
    assert_eq!(rec.path(), "a_b");
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_serialize_layout() {
    let rec = parse("foo.bar 42 1000").unwrap();
    assert_eq!(rec.serialize(), b"foo.bar 42 1000\n");
    assert_eq!(rec.serialized_len(), rec.serialize().len());
}

#[test]
fn test_serialize_round_trip() {
    for line in [
        "a.b.c 1 2",
        "x;t=1 -0.5e3 123.9",
        "host-1.cpu#0:user 3.14 1600000000",
    ] {
        let first = parse(line).unwrap().serialize();
        let again = Record::parse(&Bytes::from(first.clone()), true, Instant::now())
            .unwrap()
            .serialize();
        assert_eq!(first, again, "line {line:?}");
    }
}

#[test]
fn test_serialize_into_appends() {
    let rec = parse("a 1 2").unwrap();
    let mut buf = b"prefix ".to_vec();
    rec.serialize_into(&mut buf);
    assert_eq!(buf, b"prefix a 1 2\n");
}

#[test]
fn test_with_path_leaves_original() {
    let rec = parse("ab.c 123 123").unwrap();
    let copy = rec.with_path("de".to_string());

    assert_eq!(rec.path(), "ab.c");
    assert_eq!(copy.path(), "de");
    assert_eq!(copy.raw_value(), rec.raw_value());
    assert_eq!(copy.received_at(), rec.received_at());
}

#[test]
fn test_set_path() {
    let mut rec = parse("ab.c 123 123").unwrap();
    rec.set_path("de".to_string());
    assert_eq!(rec.serialize(), b"de 123 123\n");
}

#[test]
fn test_parse_never_panics_on_garbage() {
    let inputs: [&[u8]; 8] = [
        b"\x00\x01\x02",
        b"\xff\xfe \xfd \xfc",
        b";;; 1 1",
        b"a 1e400 1",
        b"a NaN 1",
        b"a 1 4294967295.9",
        b"a 1 4294967296",
        b"\n\n\n",
    ];

    for input in inputs {
        let line = Bytes::copy_from_slice(input);
        if let Ok(rec) = Record::parse(&line, true, Instant::now()) {
            let out = rec.serialize();
            assert!(out.starts_with(rec.path().as_bytes()));
        }
    }
}
