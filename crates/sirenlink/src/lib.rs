//! Top-level facade crate for SirenLink.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use sirenlink_core::*;
}

pub mod gateway {
    pub use sirenlink_gateway::*;
}
