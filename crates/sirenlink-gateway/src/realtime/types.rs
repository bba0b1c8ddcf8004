use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

use sirenlink_core::error::TransportError;
use sirenlink_core::protocol::{ConnectionId, OutboundEvent};

/// Outbound frame serialized once, deliverable to any number of connections.
#[derive(Debug, Clone)]
pub struct PreparedMsg {
    event: &'static str,
    text: Arc<str>,
}

impl PreparedMsg {
    pub fn prepare(ev: &OutboundEvent) -> Result<Self, TransportError> {
        Ok(Self {
            event: ev.name(),
            text: Arc::from(ev.to_json()?),
        })
    }

    pub fn event(&self) -> &'static str {
        self.event
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Convert to axum::ws::Message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.text.to_string())
    }
}

/// Send capability of one connection: deliver a named event with a payload.
///
/// Delivery is fire-and-forget. Implementations must not block.
pub trait Outbox: Send + Sync {
    fn deliver(&self, msg: &PreparedMsg) -> Result<(), TransportError>;
}

/// Outbox backed by the session's bounded outbound queue.
pub struct ChannelOutbox {
    conn: ConnectionId,
    tx: mpsc::Sender<Message>,
}

impl ChannelOutbox {
    pub fn new(conn: ConnectionId, tx: mpsc::Sender<Message>) -> Self {
        Self { conn, tx }
    }
}

impl Outbox for ChannelOutbox {
    fn deliver(&self, msg: &PreparedMsg) -> Result<(), TransportError> {
        self.tx.try_send(msg.to_ws_message()).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::QueueFull(self.conn.to_string()),
            TrySendError::Closed(_) => TransportError::Closed(self.conn.to_string()),
        })
    }
}

/// Delivery tally for one routed event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    /// Count one delivery attempt. Failures are logged and otherwise ignored.
    pub fn record(&mut self, to: &ConnectionId, event: &str, res: Result<(), TransportError>) {
        match res {
            Ok(()) => self.delivered += 1,
            Err(e) => {
                self.failed += 1;
                tracing::debug!(conn = %to, event, error = %e, "delivery dropped");
            }
        }
    }
}
