//! Inbound events (participant -> gateway).
//!
//! The frame header is parsed first; `data` is kept as `RawValue` and only
//! decoded once the event name is known.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::ValidationError;

use super::types::{GeoPoint, Role};

/// Raw inbound frame.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRoleReq {
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyReq {
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficStatusReq {
    /// Forwarded to the ambulance untouched.
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub license_plate: Option<String>,
}

/// Decoded inbound event, tagged by its wire name.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    RegisterRole(RegisterRoleReq),
    Emergency(EmergencyReq),
    TrafficStatus(TrafficStatusReq),
    UpdateLocation(GeoPoint),
    Disconnect,
}

impl InboundEvent {
    pub const REGISTER_ROLE: &'static str = "registerRole";
    pub const EMERGENCY: &'static str = "emergency";
    pub const TRAFFIC_STATUS: &'static str = "trafficStatus";
    pub const UPDATE_LOCATION: &'static str = "updateLocation";
    pub const DISCONNECT: &'static str = "disconnect";

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::RegisterRole(_) => Self::REGISTER_ROLE,
            InboundEvent::Emergency(_) => Self::EMERGENCY,
            InboundEvent::TrafficStatus(_) => Self::TRAFFIC_STATUS,
            InboundEvent::UpdateLocation(_) => Self::UPDATE_LOCATION,
            InboundEvent::Disconnect => Self::DISCONNECT,
        }
    }
}

fn parse_data<T: DeserializeOwned>(event: &str, raw: Option<Box<RawValue>>) -> Result<T, ValidationError> {
    let raw = raw.ok_or_else(|| ValidationError::Malformed(format!("{event}: missing data")))?;
    serde_json::from_str(raw.get())
        .map_err(|e| ValidationError::Malformed(format!("{event}: {e}")))
}

/// Decode one inbound text frame.
pub fn decode_inbound(text: &str) -> Result<InboundEvent, ValidationError> {
    let frame: Frame = serde_json::from_str(text)
        .map_err(|e| ValidationError::Malformed(format!("invalid frame json: {e}")))?;

    let event = frame.event.as_str();
    match event {
        InboundEvent::REGISTER_ROLE => Ok(InboundEvent::RegisterRole(parse_data(event, frame.data)?)),
        InboundEvent::EMERGENCY => Ok(InboundEvent::Emergency(parse_data(event, frame.data)?)),
        InboundEvent::TRAFFIC_STATUS => Ok(InboundEvent::TrafficStatus(parse_data(event, frame.data)?)),
        InboundEvent::UPDATE_LOCATION => Ok(InboundEvent::UpdateLocation(parse_data(event, frame.data)?)),
        InboundEvent::DISCONNECT => Ok(InboundEvent::Disconnect),
        other => Err(ValidationError::Malformed(format!("unknown event: {other}"))),
    }
}
