//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler and the codec that decodes frames once
//! before they reach the event router.

pub mod codec;
pub mod ws;
