//! HTTP API: account registration/login and geo lookups.

pub mod error;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use sirenlink_core::protocol::GeoPoint;

use crate::accounts::{NewUser, UserRecord};
use crate::app_state::AppState;
use crate::geo::{Facility, RouteGeometry};

pub use error::ApiError;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(user) = body?;
    state.users().create_user(user).await.map_err(|e| {
        tracing::warn!(error = %e, "registration failed");
        ApiError::from(e)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful!" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginReq {
    pub name: String,
    pub phone: String,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginReq>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let Json(req) = body?;
    state
        .users()
        .find_user(&req.name, &req.phone)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found!"))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
}

pub async fn hospitals(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<Vec<Facility>>, ApiError> {
    let Query(q) = query?;
    state
        .geo()
        .nearby_facilities(GeoPoint::new(q.lat, q.lon))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(lat = q.lat, lon = q.lon, error = %e, "facility lookup failed");
            ApiError::internal("Error fetching hospitals data")
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuery {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

pub async fn route(
    State(state): State<AppState>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> Result<Json<RouteGeometry>, ApiError> {
    let Query(q) = query?;
    let start = GeoPoint::new(q.start_lat, q.start_lon);
    let end = GeoPoint::new(q.end_lat, q.end_lon);
    match state.geo().route(start, end).await {
        Ok(Some(geometry)) => Ok(Json(geometry)),
        Ok(None) => Err(ApiError::not_found("No route found")),
        Err(e) => {
            tracing::warn!(error = %e, "route lookup failed");
            Err(ApiError::internal("Error fetching route data"))
        }
    }
}
