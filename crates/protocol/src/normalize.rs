//! Path normalization
//!
//! Single pass over the path bytes with a 256-entry lookup table:
//!
//! - leading and trailing `.` are stripped
//! - runs of `.` collapse to one
//! - bytes outside `[A-Za-z0-9:_\-#.]` become `_`
//!
//! The tag suffix (first `;` onward) is split off first and reattached
//! untouched. The function is pure and idempotent.

/// Replacement byte for anything outside the allowed set
const REPLACEMENT: u8 = b'_';

/// Byte -> normalized byte. Allowed bytes map to themselves.
static TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [REPLACEMENT; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        if b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'#' | b'.') {
            table[i] = b;
        }
        i += 1;
    }
    table
}

/// Whether `b` survives normalization unchanged
#[inline]
pub fn is_allowed(b: u8) -> bool {
    TABLE[b as usize] == b
}

/// Split `path` at the first `;` into `(name, tag)`
///
/// The tag keeps its leading `;`. A path without tags yields an empty tag.
#[inline]
pub fn split_tag(path: &[u8]) -> (&[u8], &[u8]) {
    match path.iter().position(|&b| b == b';') {
        Some(pos) => path.split_at(pos),
        None => (path, &[]),
    }
}

/// Normalize the name part of a path (no tag handling)
///
/// The result only contains allowed bytes, so it is always ASCII. It may be
/// empty, which callers treat as a rejected record.
pub fn normalize_name(name: &[u8]) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dot = false;

    for &b in name {
        if b == b'.' {
            // Leading dots never set the flag, trailing ones are never flushed
            pending_dot = !out.is_empty();
            continue;
        }
        if pending_dot {
            out.push('.');
            pending_dot = false;
        }
        out.push(TABLE[b as usize] as char);
    }

    out
}

/// Normalize a full path, reattaching the tag suffix verbatim
pub fn normalize(path: &[u8]) -> Vec<u8> {
    let (name, tag) = split_tag(path);
    let mut out = normalize_name(name).into_bytes();
    out.extend_from_slice(tag);
    out
}
