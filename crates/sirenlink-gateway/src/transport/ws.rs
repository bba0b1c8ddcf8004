//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (refused while draining)
//! - Assign a connection id and a bounded outbound queue
//! - Lifecycle: ping/pong + idle timeout
//! - Decode-once then hand each event to the `EventRouter`
//! - On exit, remove the connection from the registry

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use sirenlink_core::error::RouteError;
use sirenlink_core::protocol::{ConnectionId, InboundEvent};

use crate::app_state::AppState;
use crate::dispatch::ConnectionCtx;
use crate::obs::GatewayMetrics;
use crate::realtime::{ChannelOutbox, DeliveryReport};
use crate::transport::codec::{decode, Inbound};

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }
    app.metrics().ws_upgrades.inc(&[]);

    ws.on_upgrade(move |socket| async move {
        let conn = ConnectionId::new(uuid::Uuid::new_v4().to_string());
        app.metrics().ws_active_sessions.inc(&[]);
        tracing::info!(conn = %conn, "session opened");

        run_session(&app, &conn, socket).await;

        if app.router().disconnect(&conn).await {
            tracing::debug!(conn = %conn, "presence entry removed on close");
        }
        app.metrics().ws_active_sessions.dec(&[]);
        tracing::info!(conn = %conn, "session closed");
    })
}

async fn run_session(app: &AppState, conn: &ConnectionId, socket: WebSocket) {
    let gw = &app.cfg().gateway;

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.outbound_queue);
    let ctx = ConnectionCtx::new(
        conn.clone(),
        Arc::new(ChannelOutbox::new(conn.clone(), out_tx.clone())),
    );

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                match decode(msg) {
                    Ok(Inbound::Event(event)) => {
                        let closing = matches!(event, InboundEvent::Disconnect);
                        handle_event(app, &ctx, event).await;
                        if closing {
                            break;
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        enqueue_control(app.metrics(), conn, &out_tx, Message::Pong(payload));
                    }
                    Ok(Inbound::Pong) | Ok(Inbound::Ignored) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => report_failure(app, conn, "frame", &RouteError::from(e)),
                }
            }

            _ = ping_tick.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::info!(conn = %conn, "idle timeout");
                    break;
                }
                enqueue_control(app.metrics(), conn, &out_tx, Message::Ping(Vec::new()));
            }
        }
    }

    let _ = ws_tx.close().await;
}

async fn handle_event(app: &AppState, ctx: &ConnectionCtx, event: InboundEvent) {
    let name = event.name();
    app.metrics().inbound_events.inc(&[("event", name)]);

    match app.router().route(ctx, event).await {
        Ok(report) => record_deliveries(app, report),
        Err(e) => report_failure(app, ctx.connection_id(), name, &e),
    }
}

/// Queue a ping/pong frame. A full or closed queue counts as a failed delivery.
fn enqueue_control(metrics: &GatewayMetrics, conn: &ConnectionId, out_tx: &mpsc::Sender<Message>, msg: Message) {
    if let Err(e) = out_tx.try_send(msg) {
        metrics.deliveries.inc(&[("outcome", "failed")]);
        tracing::debug!(conn = %conn, error = %e, "control frame dropped");
    }
}

fn record_deliveries(app: &AppState, report: DeliveryReport) {
    let m = app.metrics();
    if report.delivered > 0 {
        m.deliveries.add(&[("outcome", "delivered")], report.delivered as u64);
    }
    if report.failed > 0 {
        m.deliveries.add(&[("outcome", "failed")], report.failed as u64);
    }
}

fn report_failure(app: &AppState, conn: &ConnectionId, event: &str, e: &RouteError) {
    app.metrics().route_failures.inc(&[("kind", e.kind())]);
    match e {
        RouteError::Transport(_) => tracing::warn!(conn = %conn, event, error = %e, "event dropped"),
        _ => tracing::info!(conn = %conn, event, error = %e, "event rejected"),
    }
}
