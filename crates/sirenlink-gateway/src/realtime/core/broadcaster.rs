use std::sync::Arc;

use sirenlink_core::error::TransportError;
use sirenlink_core::protocol::{ConnectionId, OutboundEvent};

use crate::realtime::core::registry::{ConnectionRegistry, PresenceTable};
use crate::realtime::types::{DeliveryReport, PreparedMsg};

/// Fan-out to every registered connection except the sender.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Serialize once and deliver to `AllExcept(exclude)` as of this call.
    pub async fn broadcast(&self, ev: &OutboundEvent, exclude: &ConnectionId) -> Result<DeliveryReport, TransportError> {
        let prepared = PreparedMsg::prepare(ev)?;
        let table = self.registry.lock().await;
        Ok(Self::fan_out(&table, &prepared, exclude))
    }

    /// Deliver under an already-held registry guard.
    ///
    /// Each connection in the snapshot gets at most one copy; a failed
    /// delivery is counted and skipped.
    pub fn fan_out(table: &PresenceTable, msg: &PreparedMsg, exclude: &ConnectionId) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for entry in table.all_except(exclude) {
            report.record(&entry.connection_id, msg.event(), entry.deliver(msg));
        }
        report
    }
}
