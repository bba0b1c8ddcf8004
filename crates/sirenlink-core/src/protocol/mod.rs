//! Realtime protocol (JSON text frames).
//!
//! Every frame is `{"event": <name>, "data": <payload>}` in both directions.
//! - `inbound`: events sent by participants.
//! - `outbound`: events the gateway delivers.
//! - `types`: roles, coordinates, and connection ids shared by both.
//!
//! Decoding never panics: malformed frames surface as
//! `ValidationError::Malformed`.

pub mod inbound;
pub mod outbound;
pub mod types;

pub use inbound::{decode_inbound, EmergencyReq, InboundEvent, RegisterRoleReq, TrafficStatusReq};
pub use outbound::OutboundEvent;
pub use types::{ConnectionId, GeoPoint, Role};
