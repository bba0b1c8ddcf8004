//! Realtime runtime for the SirenLink gateway.
//!
//! Presence registry, broadcast fan-out, and the send capability each
//! connection exposes to them.

pub mod core;
pub mod types;

pub use core::{Broadcaster, ConnectionEntry, ConnectionRegistry, PresenceTable, Registration};
pub use types::{ChannelOutbox, DeliveryReport, Outbox, PreparedMsg};
