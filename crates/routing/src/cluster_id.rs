//! Cluster identifier type
//!
//! `ClusterId` is the position of a cluster in the cluster set, resolved
//! from names once when the rules are compiled.

use std::fmt;

/// Cluster identifier for routing
///
/// `Copy` and two bytes wide, so rules store target lists without any
/// string handling on the record path.
///
/// # Example
///
/// ```
/// use relay_routing::ClusterId;
///
/// let cluster = ClusterId::new(0);
/// let copy = cluster;
/// assert_eq!(cluster, copy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u16);

impl ClusterId {
    /// Maximum number of clusters supported
    pub const MAX: u16 = u16::MAX;

    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Get the index as usize (for array indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}", self.0)
    }
}

impl From<u16> for ClusterId {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}

impl From<ClusterId> for usize {
    #[inline]
    fn from(id: ClusterId) -> Self {
        id.0 as usize
    }
}
