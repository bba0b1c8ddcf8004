//! SirenLink gateway library entry.
//!
//! This crate wires the WebSocket transport, the event router, the presence
//! registry, and the HTTP collaborators (accounts, geo) into one service. It
//! is consumed by the binary (`main.rs`) and by integration tests.

pub mod accounts;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod geo;
pub mod http;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
