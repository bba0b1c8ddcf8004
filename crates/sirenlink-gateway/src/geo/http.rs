use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use sirenlink_core::error::{Result, SirenError};
use sirenlink_core::protocol::GeoPoint;

use crate::config::GeoSection;

use super::{Facility, GeoProvider, RouteGeometry};

const UNKNOWN_FACILITY: &str = "Unknown";

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: RouteGeometry,
}

/// Overpass (facility search) + OSRM (routing) over HTTP.
pub struct HttpGeoProvider {
    client: reqwest::Client,
    overpass_url: String,
    osrm_url: String,
    search_radius_m: u32,
}

impl HttpGeoProvider {
    pub fn new(cfg: &GeoSection) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(concat!("sirenlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SirenError::Internal(format!("http client build failed: {e}")))?;

        Ok(Self {
            client,
            overpass_url: cfg.overpass_url.clone(),
            osrm_url: cfg.osrm_url.trim_end_matches('/').to_string(),
            search_radius_m: cfg.search_radius_m,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .await
            .map_err(|e| SirenError::Upstream(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SirenError::Upstream(format!("status {}: {body}", status.as_u16())));
        }

        resp.json::<T>()
            .await
            .map_err(|e| SirenError::Upstream(format!("invalid response body: {e}")))
    }
}

/// Overpass QL for hospitals within `radius_m` of `at`.
pub fn overpass_query(at: GeoPoint, radius_m: u32) -> String {
    format!(
        "[out:json];node(around:{radius_m},{},{})[amenity=hospital];out;",
        at.lat, at.lon
    )
}

/// OSRM driving route path; OSRM takes `lon,lat` pairs.
pub fn osrm_route_path(start: GeoPoint, end: GeoPoint) -> String {
    format!(
        "/route/v1/driving/{},{};{},{}",
        start.lon, start.lat, end.lon, end.lat
    )
}

pub(crate) fn facilities_from(resp: OverpassResponse) -> Vec<Facility> {
    resp.elements
        .into_iter()
        .filter_map(|el| {
            let (lat, lon) = (el.lat?, el.lon?);
            let name = el
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| UNKNOWN_FACILITY.to_string());
            Some(Facility { name, lat, lon })
        })
        .collect()
}

pub(crate) fn first_route(resp: OsrmResponse) -> Option<RouteGeometry> {
    resp.routes.into_iter().next().map(|r| r.geometry)
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    async fn nearby_facilities(&self, at: GeoPoint) -> Result<Vec<Facility>> {
        let query = overpass_query(at, self.search_radius_m);
        let req = self.client.get(&self.overpass_url).query(&[("data", query)]);
        let resp: OverpassResponse = self.get_json(req).await?;
        let facilities = facilities_from(resp);
        tracing::debug!(lat = at.lat, lon = at.lon, count = facilities.len(), "overpass lookup");
        Ok(facilities)
    }

    async fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<Option<RouteGeometry>> {
        let url = format!("{}{}", self.osrm_url, osrm_route_path(start, end));
        let req = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")]);
        let resp: OsrmResponse = self.get_json(req).await?;
        Ok(first_route(resp))
    }
}
