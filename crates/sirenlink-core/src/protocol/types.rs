use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque per-connection identifier assigned by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Participant category.
///
/// On the wire roles use the display form clients send (`"Traffic Police"`);
/// the compact form (`"TrafficPolice"`) is accepted too. Anything else is
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    AmbulanceDriver,
    TrafficPolice,
    Other,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::AmbulanceDriver => "Ambulance Driver",
            Role::TrafficPolice => "Traffic Police",
            Role::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Ambulance Driver" | "AmbulanceDriver" => Role::AmbulanceDriver,
            "Traffic Police" | "TrafficPolice" => Role::TrafficPolice,
            other => {
                tracing::debug!(role = %other, "unrecognised role, treating as Other");
                Role::Other
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s)
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        r.as_str().to_string()
    }
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}
