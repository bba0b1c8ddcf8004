//! Realtime core components for the gateway runtime.
//!
//! The connection registry (presence) and the broadcaster that fans out over it.

mod broadcaster;
mod registry;

pub use broadcaster::Broadcaster;
pub use registry::{ConnectionEntry, ConnectionRegistry, PresenceTable, Registration};
