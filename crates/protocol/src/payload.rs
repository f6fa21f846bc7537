//! Main queue items
//!
//! Listeners push raw lines onto the main queue, one line per slot. The
//! batched TCP listener instead accumulates lines and pushes one
//! [`Payload::Batch`] per flush.

use bytes::Bytes;

/// One main-queue slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A single raw line, without its newline
    Line(Bytes),
    /// Several raw lines from one connection, in arrival order
    Batch(Vec<Bytes>),
}

impl Payload {
    /// Number of lines carried by this slot
    #[inline]
    pub fn line_count(&self) -> usize {
        match self {
            Self::Line(_) => 1,
            Self::Batch(lines) => lines.len(),
        }
    }

    /// Iterate over the carried lines in order
    pub fn lines(&self) -> impl Iterator<Item = &Bytes> {
        let (single, many) = match self {
            Self::Line(line) => (Some(line), [].iter()),
            Self::Batch(lines) => (None, lines.iter()),
        };
        single.into_iter().chain(many)
    }
}

impl From<Bytes> for Payload {
    fn from(line: Bytes) -> Self {
        Self::Line(line)
    }
}

/// Accumulates lines for the batched listener
///
/// Mirrors the line-at-a-time path: `push` reports when the batch is full and
/// `take` hands the lines over, leaving an empty batch behind.
#[derive(Debug)]
pub struct LineBatch {
    lines: Vec<Bytes>,
    max_lines: usize,
}

impl LineBatch {
    /// Create an empty batch that fills up at `max_lines` (min 1)
    pub fn new(max_lines: usize) -> Self {
        let max_lines = max_lines.max(1);
        Self {
            lines: Vec::with_capacity(max_lines),
            max_lines,
        }
    }

    /// Add a line, returning true when the batch is now full
    #[inline]
    pub fn push(&mut self, line: Bytes) -> bool {
        self.lines.push(line);
        self.is_full()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.max_lines
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Take the accumulated lines as one payload
    pub fn take(&mut self) -> Payload {
        let lines = std::mem::replace(&mut self.lines, Vec::with_capacity(self.max_lines));
        Payload::Batch(lines)
    }
}
