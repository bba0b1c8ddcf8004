//! Event dispatch.
//!
//! Re-exports the event router and the per-connection context so downstream
//! consumers can depend on this module directly.

pub mod event_router;

pub use event_router::{ConnectionCtx, EventRouter};
