//! Geo collaborator: nearby-facility search and route geometry.
//!
//! `HttpGeoProvider` talks to Overpass and OSRM; `CachedGeo` fronts any
//! provider with a TTL cache keyed on rounded coordinates.

pub mod cache;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sirenlink_core::error::Result;
use sirenlink_core::protocol::GeoPoint;

pub use cache::{coord_key, CachedGeo, TtlCache};
pub use http::HttpGeoProvider;

/// A point of interest returned by facility search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// GeoJSON geometry of a computed route.
pub type RouteGeometry = Value;

#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Hospitals around `at`.
    async fn nearby_facilities(&self, at: GeoPoint) -> Result<Vec<Facility>>;

    /// Driving route geometry, `None` when the router finds no route.
    async fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<Option<RouteGeometry>>;
}
