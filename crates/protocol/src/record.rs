//! Graphite record model
//!
//! A [`Record`] is built by a worker from one raw line and then shared
//! read-only (behind `Arc`) by every host it is routed to. The raw value and
//! timestamp are kept as zero-copy slices of the input line so serialization
//! reproduces them byte-for-byte.

use std::time::Instant;

use bytes::Bytes;

use crate::error::ParseError;
use crate::normalize::{normalize_name, split_tag};

/// Graphite field separator test (space, tab, LF, VT, FF, CR)
#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Split `line` into whitespace-separated fields
///
/// Returns the `(start, end)` ranges of the first three fields and the total
/// number of fields seen, so the caller can reject any count other than 3
/// without allocating.
fn fields(line: &[u8]) -> ([(usize, usize); 3], usize) {
    let mut ranges = [(0, 0); 3];
    let mut count = 0;
    let mut i = 0;

    while i < line.len() {
        while i < line.len() && is_space(line[i]) {
            i += 1;
        }
        if i == line.len() {
            break;
        }
        let start = i;
        while i < line.len() && !is_space(line[i]) {
            i += 1;
        }
        if count < 3 {
            ranges[count] = (start, i);
        }
        count += 1;
    }

    (ranges, count)
}

/// Parse a timestamp field
///
/// Returns the seconds and whether the fractional fallback was used.
fn parse_time(raw: &[u8]) -> Result<(u32, bool), ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::invalid_timestamp(raw))?;

    if let Ok(secs) = text.parse::<u32>() {
        return Ok((secs, false));
    }

    // Legacy clients send float timestamps; truncate toward zero
    let float = text
        .parse::<f64>()
        .map_err(|_| ParseError::invalid_timestamp(raw))?;
    let truncated = float.trunc();
    if !truncated.is_finite() || truncated < 0.0 || truncated > u32::MAX as f64 {
        return Err(ParseError::invalid_timestamp(raw));
    }

    Ok((truncated as u32, true))
}

/// One Graphite data point
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Metric name without the tag suffix
    path: String,
    /// Tag suffix including the leading `;`, empty when untagged
    tag: Bytes,
    /// Value exactly as received
    raw_value: Bytes,
    value: f64,
    /// Timestamp exactly as received
    raw_time: Bytes,
    time: u32,
    /// Timestamp was fractional and got truncated
    fractional_time: bool,
    received_at: Instant,
}

impl Record {
    /// Parse one line (with or without its trailing newline)
    ///
    /// With `normalize` the path is normalized (see [`crate::normalize`]),
    /// otherwise it only has to be non-empty UTF-8. `received_at` is stamped
    /// on the record and later used for the per-host processing histogram.
    pub fn parse(line: &Bytes, normalize: bool, received_at: Instant) -> Result<Self, ParseError> {
        let (ranges, count) = fields(line);
        if count != 3 {
            return Err(ParseError::FieldCount(count));
        }
        let [(ps, pe), (vs, ve), (ts, te)] = ranges;

        let raw_path = &line[ps..pe];
        let raw_value = &line[vs..ve];
        let raw_time = &line[ts..te];

        let value = std::str::from_utf8(raw_value)
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| ParseError::invalid_value(raw_value))?;
        let (time, fractional_time) = parse_time(raw_time)?;

        let (name, tag) = split_tag(raw_path);
        let path = if normalize {
            normalize_name(name)
        } else {
            std::str::from_utf8(name)
                .map_err(|_| ParseError::InvalidUtf8)?
                .to_owned()
        };
        if path.is_empty() {
            return Err(ParseError::EmptyPath);
        }

        let tag_start = ps + name.len();
        Ok(Self {
            path,
            tag: line.slice(tag_start..tag_start + tag.len()),
            raw_value: line.slice(vs..ve),
            value,
            raw_time: line.slice(ts..te),
            time,
            fractional_time,
            received_at,
        })
    }

    /// Metric name used for matching, rewriting and hashing
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Tag suffix (`;k=v...`), empty when untagged
    #[inline]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn raw_value(&self) -> &[u8] {
        &self.raw_value
    }

    #[inline]
    pub fn time(&self) -> u32 {
        self.time
    }

    #[inline]
    pub fn raw_time(&self) -> &[u8] {
        &self.raw_time
    }

    /// Whether the timestamp was fractional and truncated
    #[inline]
    pub fn has_fractional_time(&self) -> bool {
        self.fractional_time
    }

    #[inline]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Replace the path in place
    #[inline]
    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    /// Copy of this record carrying a different path
    pub fn with_path(&self, path: String) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    /// Serialized length, including the trailing newline
    #[inline]
    pub fn serialized_len(&self) -> usize {
        self.path.len() + self.tag.len() + self.raw_value.len() + self.raw_time.len() + 3
    }

    /// Append `path‖tag value time\n` to `buf`
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.serialized_len());
        buf.extend_from_slice(self.path.as_bytes());
        buf.extend_from_slice(&self.tag);
        buf.push(b' ');
        buf.extend_from_slice(&self.raw_value);
        buf.push(b' ');
        buf.extend_from_slice(&self.raw_time);
        buf.push(b'\n');
    }

    /// Serialize into a fresh buffer
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.serialize_into(&mut buf);
        buf
    }

    /// Path with its tag suffix, as sent over the RPC egress
    pub fn full_path(&self) -> String {
        let mut full = self.path.clone();
        full.push_str(&String::from_utf8_lossy(&self.tag));
        full
    }
}
