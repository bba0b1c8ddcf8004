//! SirenLink gateway binary.
//!
//! - WebSocket endpoint: /ws
//! - HTTP API: /register, /login, /hospitals, /route
//! - Ops: /healthz, /readyz, /metrics

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use sirenlink_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match config::load_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    let listen: SocketAddr = match cfg.gateway.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(listen = %cfg.gateway.listen, error = %e, "gateway.listen must be a valid SocketAddr");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(cfg) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to build application state");
            return ExitCode::FAILURE;
        }
    };
    let app = router::build_router(state.clone());

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%listen, "sirenlink-gateway listening");

    let drain = state.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            drain.shutdown().await;
        })
        .await;

    if let Err(e) = served {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }
    tracing::info!("sirenlink-gateway stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
