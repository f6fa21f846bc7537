//! Tests for path normalization

use crate::normalize::{is_allowed, normalize, normalize_name, split_tag};

#[test]
fn test_allowed_set() {
    for b in b"azAZ09:_-#.".iter() {
        assert!(is_allowed(*b), "byte {:?} should be allowed", *b as char);
    }
    for b in b" /\\;=,*?()[]{}\"'@!$%^&+~`|<>".iter() {
        assert!(!is_allowed(*b), "byte {:?} should be replaced", *b as char);
    }
    assert!(!is_allowed(0x00));
    assert!(!is_allowed(0x80));
    assert!(!is_allowed(0xff));
}

#[test]
fn test_strip_and_collapse_dots() {
    assert_eq!(normalize_name(b"a.b.c"), "a.b.c");
    assert_eq!(normalize_name(b".a.b"), "a.b");
    assert_eq!(normalize_name(b"a.b."), "a.b");
    assert_eq!(normalize_name(b"...a...b..."), "a.b");
    assert_eq!(normalize_name(b"..."), "");
    assert_eq!(normalize_name(b""), "");
}

#[test]
fn test_replace_disallowed_bytes() {
    assert_eq!(normalize_name(b"a/b c"), "a_b_c");
    assert_eq!(normalize_name(b"host-1:cpu#2"), "host-1:cpu#2");
    // Multi-byte UTF-8 is replaced byte by byte
    assert_eq!(normalize_name("é".as_bytes()), "__");
}

#[test]
fn test_replacement_does_not_create_dots() {
    // `_` is never merged with surrounding dots
    assert_eq!(normalize_name(b"./."), "_");
    assert_eq!(normalize_name(b"a./.b"), "a._.b");
}

#[test]
fn test_split_tag() {
    assert_eq!(split_tag(b"a.b"), (&b"a.b"[..], &b""[..]));
    assert_eq!(split_tag(b"a.b;x=1;y=2"), (&b"a.b"[..], &b";x=1;y=2"[..]));
    assert_eq!(split_tag(b";x=1"), (&b""[..], &b";x=1"[..]));
}

#[test]
fn test_normalize_reattaches_tag_verbatim() {
    assert_eq!(normalize(b"..a b;x=1 2/3"), b"a_b;x=1 2/3".to_vec());
}

#[test]
fn test_normalize_idempotent() {
    let samples: [&[u8]; 10] = [
        b"a.b.c",
        b"..a..b..",
        b"a b/c\\d",
        b"a;tag=1",
        b";only=tag",
        b"...",
        b"\xff\x00.\x7f",
        b"a.;b",
        b"x..y;z..w",
        b"#:_-.",
    ];

    for p in samples {
        let once = normalize(p);
        let twice = normalize(&once);
        assert_eq!(once, twice, "path {p:?}");

        let (name, _) = split_tag(&once);
        assert!(name.iter().all(|&b| is_allowed(b)), "path {p:?}");
    }
}
