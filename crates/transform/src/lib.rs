//! Relay Transform - Path rewriting
//!
//! Regex-driven rewriting of record paths before routing.
//!
//! # Overview
//!
//! ```text
//! [Record] → [Rewrite 1] → [Rewrite 2] → ... → [Record, copies...]
//! ```
//!
//! Rules are compiled once from the rewrites file and shared by all
//! workers. An empty rewriter is the identity.
//!
//! # Example
//!
//! ```ignore
//! let rewriter = Rewriter::from_config(&rewrites)?;
//! let mut out = Vec::new();
//! rewriter.apply_into(record, &mut out);
//! for record in out.drain(..) {
//!     rules.route(&record, ...);
//! }
//! ```

mod error;
mod rewrite;

pub use error::RewriteError;
pub use rewrite::{Rewrite, Rewriter};

#[cfg(test)]
mod rewrite_test;
