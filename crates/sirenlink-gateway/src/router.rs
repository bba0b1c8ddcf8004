//! Axum router wiring.
//!
//! `/ws` upgrades to the realtime channel; the remaining routes are the HTTP
//! API and operational endpoints.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, http, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cfg().gateway.allowed_origins);

    let router = Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/register", post(http::register))
        .route("/login", post(http::login))
        .route("/hospitals", get(http::hospitals))
        .route("/route", get(http::route))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}
