//! Tests for the path rewriter

use std::str::FromStr;
use std::time::Instant;

use relay_config::RewritesConfig;
use relay_protocol::{Bytes, Record};

use crate::error::RewriteError;
use crate::rewrite::{Rewrite, Rewriter};

fn record(line: &'static str) -> Record {
    Record::parse(&Bytes::from_static(line.as_bytes()), true, Instant::now()).unwrap()
}

fn paths(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.path()).collect()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_from_config() {
    let config = RewritesConfig::from_str(
        "[[rewrites]]\nfrom = \"a\"\nto = \"b\"\n[[rewrites]]\nfrom = \"c\"\nto = \"d\"\ncopy = true\n",
    )
    .unwrap();
    let rewriter = Rewriter::from_config(&config).unwrap();

    assert_eq!(rewriter.len(), 2);
    assert!(!rewriter.is_empty());
}

#[test]
fn test_invalid_regex_fails_at_build() {
    let config = RewritesConfig::from_str(
        "[[rewrites]]\nfrom = \"ok\"\nto = \"x\"\n[[rewrites]]\nfrom = \"(unclosed\"\nto = \"x\"\n",
    )
    .unwrap();

    let err = Rewriter::from_config(&config).unwrap_err();
    assert!(matches!(err, RewriteError::InvalidRegex { index: 1, .. }));
}

#[test]
fn test_rewrite_new() {
    let rule = Rewrite::new("^a\\.(\\w+)", "b.$1", true).unwrap();
    assert!(rule.is_copy());
    assert_eq!(rule.pattern(), "^a\\.(\\w+)");
    assert!(Rewrite::new("[", "x", false).is_err());
}

// =============================================================================
// Application
// =============================================================================

#[test]
fn test_empty_rewriter_is_identity() {
    let rewriter = Rewriter::empty();
    let rec = record("ab.c 123 123");

    let out = rewriter.apply(rec.clone());
    assert_eq!(out, vec![rec]);
}

#[test]
fn test_in_place_rewrite() {
    let rewriter = Rewriter::new(vec![Rewrite::new("ab.c", "de", false).unwrap()]);

    let out = rewriter.apply(record("ab.c 123 123"));
    assert_eq!(paths(&out), vec!["de"]);
    assert_eq!(out[0].serialize(), b"de 123 123\n");
}

#[test]
fn test_copy_rewrite_keeps_original_first() {
    let rewriter = Rewriter::new(vec![Rewrite::new("ab.c", "de", true).unwrap()]);

    let out = rewriter.apply(record("ab.c 123 123"));
    assert_eq!(paths(&out), vec!["ab.c", "de"]);
}

#[test]
fn test_no_match_leaves_record() {
    let rewriter = Rewriter::new(vec![Rewrite::new("^zzz", "y", true).unwrap()]);

    let out = rewriter.apply(record("ab.c 1 1"));
    assert_eq!(paths(&out), vec!["ab.c"]);
}

#[test]
fn test_backreferences() {
    let rewriter = Rewriter::new(vec![
        Rewrite::new(r"^servers\.(\w+)\.cpu\.(\w+)$", "hosts.$1.$2", false).unwrap(),
    ]);

    let out = rewriter.apply(record("servers.web01.cpu.user 1 1"));
    assert_eq!(paths(&out), vec!["hosts.web01.user"]);
}

#[test]
fn test_replace_all_occurrences() {
    let rewriter = Rewriter::new(vec![Rewrite::new("a", "x", false).unwrap()]);

    let out = rewriter.apply(record("a.ba.a 1 1"));
    assert_eq!(paths(&out), vec!["x.bx.x"]);
}

#[test]
fn test_later_rules_see_in_place_rewrites() {
    let rewriter = Rewriter::new(vec![
        Rewrite::new("^a", "b", false).unwrap(),
        Rewrite::new("^b", "c", false).unwrap(),
    ]);

    let out = rewriter.apply(record("a.x 1 1"));
    assert_eq!(paths(&out), vec!["c.x"]);
}

#[test]
fn test_copies_are_not_rewritten_further() {
    let rewriter = Rewriter::new(vec![
        Rewrite::new("^a", "copy", true).unwrap(),
        Rewrite::new("^a", "moved", false).unwrap(),
        Rewrite::new("^moved", "second", true).unwrap(),
    ]);

    let out = rewriter.apply(record("a.x 1 1"));
    assert_eq!(paths(&out), vec!["moved.x", "copy.x", "second.x"]);
}

#[test]
fn test_tag_survives_rewrite() {
    let rewriter = Rewriter::new(vec![Rewrite::new("ab", "cd", true).unwrap()]);

    let out = rewriter.apply(record("ab.c;env=prod 1 1"));
    assert_eq!(out[1].serialize(), b"cd.c;env=prod 1 1\n");
}

#[test]
fn test_apply_into_reuses_buffer() {
    let rewriter = Rewriter::new(vec![Rewrite::new("a", "b", true).unwrap()]);
    let mut out = Vec::new();

    assert_eq!(rewriter.apply_into(record("a 1 1"), &mut out), 2);
    assert_eq!(rewriter.apply_into(record("z 1 1"), &mut out), 1);
    assert_eq!(paths(&out), vec!["a", "b", "z"]);
}
