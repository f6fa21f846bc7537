//! Relay - Routing
//!
//! Ordered match-and-route rule engine.
//!
//! # Design
//!
//! Rules are compiled at config load time: regexes into one `RegexSet` per
//! rule, prefixes into a byte trie, cluster names into `ClusterId`s. The
//! hot path does no string handling beyond matching the path itself.
//!
//! - `ClusterId` is `Copy` and two bytes wide
//! - `route()` reports targets through a callback, nothing is allocated
//!   for up to 128 clusters
//! - a record reaches each cluster at most once per invocation, even when
//!   several `continue` rules name it
//!
//! # Example
//!
//! ```
//! use relay_routing::{ClusterId, Rules};
//!
//! let rules = Rules::builder(&["graphite", "devnull"])
//!     .rule(&["^servers\\."], &[] as &[&str], &["graphite"], true)
//!     .rule(&[".*"], &[] as &[&str], &["devnull"], false)
//!     .build()
//!     .unwrap();
//!
//! let targets = rules.targets_for("servers.web01.cpu");
//! assert_eq!(targets, vec![ClusterId::new(0), ClusterId::new(1)]);
//! ```

mod cluster_id;
mod error;
mod rules;
mod trie;


pub use cluster_id::ClusterId;
pub use error::{Result, RoutingError};
pub use rules::{Rule, Rules, RulesBuilder};
pub use trie::PrefixTrie;
