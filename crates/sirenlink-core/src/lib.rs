//! SirenLink core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the realtime wire contracts (inbound and outbound
//! events, roles, coordinates) and the error surface shared by the gateway.
//! It carries no transport or runtime dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input must
//! surface as `ValidationError` / `SirenError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, RouteError, SirenError};
