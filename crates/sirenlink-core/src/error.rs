//! Shared error types across SirenLink crates.
//!
//! Two surfaces live here:
//! - `SirenError`: the unified crate error (config, collaborators, HTTP).
//! - `RouteError`: the routing taxonomy produced while handling realtime events.
//!   Route errors are always handled locally (logged and counted); they are
//!   never sent back to the originating connection.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// A third-party service failed or timed out.
    Upstream,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Upstream => "UPSTREAM",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SirenError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SirenError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SirenError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SirenError::BadRequest(_) => ClientCode::BadRequest,
            SirenError::Upstream(_) => ClientCode::Upstream,
            SirenError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SirenError::Internal(_) => ClientCode::Internal,
        }
    }
}

/// A required event field is missing or the frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing license plate")]
    MissingLicensePlate,
    #[error("license plate {0} is already registered")]
    DuplicateLicensePlate(String),
    #[error("malformed event: {0}")]
    Malformed(String),
}

/// No eligible target exists for a targeted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("no responder available")]
    NoResponderAvailable,
    #[error("target not found")]
    TargetNotFound,
}

/// A delivery to a single connection could not be enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection {0} is closed")]
    Closed(String),
    #[error("outbound queue of connection {0} is full")]
    QueueFull(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Failure while routing one inbound realtime event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("lookup: {0}")]
    Lookup(#[from] LookupFailure),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

impl RouteError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::Validation(ValidationError::MissingLicensePlate) => "missing_license_plate",
            RouteError::Validation(ValidationError::DuplicateLicensePlate(_)) => {
                "duplicate_license_plate"
            }
            RouteError::Validation(ValidationError::Malformed(_)) => "malformed",
            RouteError::Lookup(LookupFailure::NoResponderAvailable) => "no_responder_available",
            RouteError::Lookup(LookupFailure::TargetNotFound) => "target_not_found",
            RouteError::Transport(_) => "transport",
        }
    }
}
