//! Outbound events (gateway -> participant).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

use super::types::{ConnectionId, GeoPoint, Role};

/// Outbound event, serialized as `{"event": <name>, "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    EmergencyAlert {
        license_plate: String,
        location: Option<GeoPoint>,
    },
    /// Last known position of the responder; both fields are null when the
    /// responder never reported a location.
    PoliceLocation { lat: Option<f64>, lon: Option<f64> },
    TrafficStatusUpdate { status: Value },
    #[serde(rename_all = "camelCase")]
    LiveLocationUpdate {
        connection_id: ConnectionId,
        lat: f64,
        lon: f64,
        role: Role,
    },
}

impl OutboundEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::EmergencyAlert { .. } => "emergencyAlert",
            OutboundEvent::PoliceLocation { .. } => "policeLocation",
            OutboundEvent::TrafficStatusUpdate { .. } => "trafficStatusUpdate",
            OutboundEvent::LiveLocationUpdate { .. } => "liveLocationUpdate",
        }
    }

    pub fn police_location(at: Option<GeoPoint>) -> Self {
        OutboundEvent::PoliceLocation {
            lat: at.map(|p| p.lat),
            lon: at.map(|p| p.lon),
        }
    }

    /// Encode to a text frame.
    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encode(format!("{}: {e}", self.name())))
    }
}
