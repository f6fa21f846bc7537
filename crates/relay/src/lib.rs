//! Graphite Relay
//!
//! Wires the workspace crates into a running relay and owns its lifecycle.
//!
//! ```text
//! listeners ─→ main queue ─→ workers ─→ host queues ─→ host streamers ─→ downstream
//! ```
//!
//! Shutdown runs in dependency order: listeners stop, the main queue closes,
//! workers drain, host queues close, host streamers flush. The binary wraps
//! [`Relay`] with a CLI, logging setup and signal handling.

mod configs;
mod relay;

pub use configs::Configs;
pub use relay::{BoundAddrs, FORCE_QUIT_MESSAGE, Relay};
