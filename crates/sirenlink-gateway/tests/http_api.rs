#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use sirenlink_core::error::{Result, SirenError};
use sirenlink_core::protocol::GeoPoint;
use sirenlink_gateway::accounts::InMemoryUserStore;
use sirenlink_gateway::app_state::AppState;
use sirenlink_gateway::config::GatewayConfig;
use sirenlink_gateway::geo::{CachedGeo, Facility, GeoProvider, RouteGeometry};
use sirenlink_gateway::router::build_router;

#[derive(Default)]
struct Calls {
    facilities: AtomicUsize,
    routes: AtomicUsize,
    fail: AtomicBool,
}

/// Geo provider with canned answers. A route exists only when start and end differ.
#[derive(Clone, Default)]
struct FakeGeo {
    calls: Arc<Calls>,
}

#[async_trait]
impl GeoProvider for FakeGeo {
    async fn nearby_facilities(&self, at: GeoPoint) -> Result<Vec<Facility>> {
        self.calls.facilities.fetch_add(1, Ordering::SeqCst);
        if self.calls.fail.load(Ordering::SeqCst) {
            return Err(SirenError::Upstream("overpass down".into()));
        }
        Ok(vec![Facility {
            name: "City Hospital".into(),
            lat: at.lat + 0.01,
            lon: at.lon,
        }])
    }

    async fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<Option<RouteGeometry>> {
        self.calls.routes.fetch_add(1, Ordering::SeqCst);
        if self.calls.fail.load(Ordering::SeqCst) {
            return Err(SirenError::Upstream("osrm down".into()));
        }
        if start == end {
            return Ok(None);
        }
        Ok(Some(json!({
            "type": "LineString",
            "coordinates": [[start.lon, start.lat], [end.lon, end.lat]],
        })))
    }
}

fn app() -> (AppState, Router, FakeGeo) {
    let cfg = GatewayConfig::default();
    let fake = FakeGeo::default();
    let geo = CachedGeo::new(fake.clone(), &cfg.geo);
    let state = AppState::with_collaborators(cfg, Arc::new(InMemoryUserStore::new()), Arc::new(geo));
    let router = build_router(state.clone());
    (state, router, fake)
}

async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn register_then_login() {
    let (_, router, _) = app();

    let (status, body) = call(
        &router,
        post_json(
            "/register",
            json!({"name": "Ravi", "role": "Ambulance Driver", "licensePlate": "KA-01", "phone": "555-0100"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"message": "Registration successful!"}));

    let (status, body) = call(&router, post_json("/login", json!({"name": "Ravi", "phone": "555-0100"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ravi");
    assert_eq!(body["role"], "Ambulance Driver");
    assert_eq!(body["licensePlate"], "KA-01");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn login_unknown_user_is_404() {
    let (_, router, _) = app();
    let (status, body) = call(&router, post_json("/login", json!({"name": "Nobody", "phone": "0"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "User not found!"}));
}

#[tokio::test]
async fn register_blank_phone_is_400() {
    let (_, router, _) = app();
    let (status, body) = call(
        &router,
        post_json("/register", json!({"name": "Ravi", "role": "Traffic Police", "phone": " "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn hospitals_are_cached_by_rounded_coordinates() {
    let (_, router, fake) = app();

    let (status, body) = call(&router, get("/hospitals?lat=12.97160&lon=77.59460")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "City Hospital");

    let (status, _) = call(&router, get("/hospitals?lat=12.97162&lon=77.59458")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.calls.facilities.load(Ordering::SeqCst), 1);

    call(&router, get("/hospitals?lat=13.0&lon=77.5")).await;
    assert_eq!(fake.calls.facilities.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn hospitals_upstream_failure_is_500() {
    let (_, router, fake) = app();
    fake.calls.fail.store(true, Ordering::SeqCst);

    let (status, body) = call(&router, get("/hospitals?lat=1&lon=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Error fetching hospitals data"}));

    // Failures are not cached.
    fake.calls.fail.store(false, Ordering::SeqCst);
    let (status, _) = call(&router, get("/hospitals?lat=1&lon=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.calls.facilities.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn route_found_and_cached() {
    let (_, router, fake) = app();
    let uri = "/route?startLat=12.9&startLon=77.5&endLat=13.0&endLon=77.6";

    let (status, body) = call(&router, get(uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "LineString");

    call(&router, get(uri)).await;
    assert_eq!(fake.calls.routes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn route_not_found_is_404_and_not_cached() {
    let (_, router, fake) = app();
    let uri = "/route?startLat=1&startLon=1&endLat=1&endLon=1";

    let (status, body) = call(&router, get(uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No route found"}));

    call(&router, get(uri)).await;
    assert_eq!(fake.calls.routes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn route_upstream_failure_is_500() {
    let (_, router, fake) = app();
    fake.calls.fail.store(true, Ordering::SeqCst);
    let (status, body) = call(&router, get("/route?startLat=1&startLon=1&endLat=2&endLon=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Error fetching route data"}));
}

#[tokio::test]
async fn ops_endpoints_follow_drain_state() {
    let (state, router, _) = app();

    let (status, _) = call(&router, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&router, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("sirenlink_registry_entries 0"));

    state.shutdown().await;
    let (status, _) = call(&router, get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let (_, router, _) = app();
    let req = Request::builder()
        .uri("/healthz")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn bad_query_parameters_get_json_errors() {
    let (_, router, fake) = app();

    let (status, body) = call(&router, get("/hospitals?lat=12.9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = call(&router, get("/route?startLat=x&startLon=1&endLat=2&endLon=2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    assert_eq!(fake.calls.facilities.load(Ordering::SeqCst), 0);
    assert_eq!(fake.calls.routes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_login_body_gets_json_error() {
    let (_, router, _) = app();
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let (status, body) = call(&router, req).await;
    assert!(status.is_client_error());
    assert!(body["error"].as_str().is_some());
}
