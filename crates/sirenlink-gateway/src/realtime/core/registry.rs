use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use sirenlink_core::error::{TransportError, ValidationError};
use sirenlink_core::protocol::{ConnectionId, GeoPoint, Role};

use crate::realtime::types::{Outbox, PreparedMsg};

/// One registered participant.
#[derive(Clone)]
pub struct ConnectionEntry {
    pub connection_id: ConnectionId,
    pub role: Role,
    pub name: Option<String>,
    pub license_plate: Option<String>,
    pub location: Option<GeoPoint>,
    outbox: Arc<dyn Outbox>,
}

impl ConnectionEntry {
    /// Deliver a prepared frame to this connection.
    pub fn deliver(&self, msg: &PreparedMsg) -> Result<(), TransportError> {
        self.outbox.deliver(msg)
    }
}

impl fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("connection_id", &self.connection_id)
            .field("role", &self.role)
            .field("name", &self.name)
            .field("license_plate", &self.license_plate)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Attributes sent with `registerRole`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub role: Role,
    pub name: Option<String>,
    pub license_plate: Option<String>,
}

struct Slot {
    entry: ConnectionEntry,
    registered_seq: u64,
}

/// Presence table: `connection_id -> entry`, ordered by first registration.
///
/// Every method is synchronous; callers reach the table through
/// `ConnectionRegistry::lock`, which provides the single exclusive section all
/// reads and writes share.
#[derive(Default)]
pub struct PresenceTable {
    slots: HashMap<ConnectionId, Slot>,
    next_seq: u64,
    unique_license_plates: bool,
}

impl PresenceTable {
    pub fn new(unique_license_plates: bool) -> Self {
        Self {
            slots: HashMap::new(),
            next_seq: 1,
            unique_license_plates,
        }
    }

    /// Create or overwrite the entry for `id`.
    ///
    /// Re-registration keeps the recorded location and the original
    /// registration order. A driver without a plate is still registered but
    /// cannot be targeted by `trafficStatus`.
    pub fn register(
        &mut self,
        id: ConnectionId,
        reg: Registration,
        outbox: Arc<dyn Outbox>,
    ) -> Result<(), ValidationError> {
        let plate = reg
            .license_plate
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if reg.role == Role::AmbulanceDriver {
            match plate.as_deref() {
                None => {
                    tracing::warn!(conn = %id, "ambulance driver registered without a license plate");
                }
                Some(plate)
                    if self.unique_license_plates
                        && self.slots.values().any(|s| {
                            s.entry.connection_id != id
                                && s.entry.role == Role::AmbulanceDriver
                                && s.entry.license_plate.as_deref() == Some(plate)
                        }) =>
                {
                    return Err(ValidationError::DuplicateLicensePlate(plate.to_string()));
                }
                Some(_) => {}
            }
        }

        if let Some(slot) = self.slots.get_mut(&id) {
            slot.entry.role = reg.role;
            slot.entry.name = reg.name;
            slot.entry.license_plate = plate;
            slot.entry.outbox = outbox;
            return Ok(());
        }

        let registered_seq = self.next_seq;
        self.next_seq += 1;
        let entry = ConnectionEntry {
            connection_id: id.clone(),
            role: reg.role,
            name: reg.name,
            license_plate: plate,
            location: None,
            outbox,
        };
        self.slots.insert(id, Slot { entry, registered_seq });
        Ok(())
    }

    /// Record a location. Returns false (and changes nothing) when `id` is not registered.
    pub fn update_location(&mut self, id: &ConnectionId, at: GeoPoint) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.entry.location = Some(at);
                true
            }
            None => false,
        }
    }

    /// Idempotent removal.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.slots.remove(id).map(|slot| slot.entry)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.slots.get(id).map(|slot| &slot.entry)
    }

    /// Earliest-registered entry with `role`. Not distance based.
    pub fn find_first_by_role(&self, role: Role) -> Option<&ConnectionEntry> {
        self.first_matching(|e| e.role == role)
    }

    /// Earliest-registered entry matching both `role` and `plate`.
    pub fn find_by_role_and_license_plate(&self, role: Role, plate: &str) -> Option<&ConnectionEntry> {
        let plate = plate.trim();
        self.first_matching(|e| e.role == role && e.license_plate.as_deref() == Some(plate))
    }

    /// All entries except `id`, in registration order.
    pub fn all_except(&self, id: &ConnectionId) -> Vec<&ConnectionEntry> {
        let mut slots: Vec<&Slot> = self
            .slots
            .values()
            .filter(|s| &s.entry.connection_id != id)
            .collect();
        slots.sort_by_key(|s| s.registered_seq);
        slots.into_iter().map(|s| &s.entry).collect()
    }

    /// Registered connection ids, in registration order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|s| s.registered_seq);
        slots.into_iter().map(|s| s.entry.connection_id.clone()).collect()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.slots.values().filter(|s| s.entry.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn first_matching(&self, pred: impl Fn(&ConnectionEntry) -> bool) -> Option<&ConnectionEntry> {
        self.slots
            .values()
            .filter(|s| pred(&s.entry))
            .min_by_key(|s| s.registered_seq)
            .map(|s| &s.entry)
    }
}

/// Authoritative registry of connected participants.
///
/// Constructed once per server and shared via `Arc`. All access goes through a
/// single mutex; lookups and the deliveries they select are performed under
/// the same guard, so a selected entry cannot disappear before delivery.
pub struct ConnectionRegistry {
    table: Mutex<PresenceTable>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConnectionRegistry {
    pub fn new(unique_license_plates: bool) -> Self {
        Self {
            table: Mutex::new(PresenceTable::new(unique_license_plates)),
        }
    }

    /// Enter the exclusive section.
    pub async fn lock(&self) -> MutexGuard<'_, PresenceTable> {
        self.table.lock().await
    }

    pub async fn register(
        &self,
        id: ConnectionId,
        reg: Registration,
        outbox: Arc<dyn Outbox>,
    ) -> Result<(), ValidationError> {
        self.lock().await.register(id, reg, outbox)
    }

    pub async fn update_location(&self, id: &ConnectionId, at: GeoPoint) -> bool {
        self.lock().await.update_location(id, at)
    }

    pub async fn remove(&self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.lock().await.remove(id)
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.lock().await.get(id).cloned()
    }

    pub async fn find_first_by_role(&self, role: Role) -> Option<ConnectionEntry> {
        self.lock().await.find_first_by_role(role).cloned()
    }

    pub async fn find_by_role_and_license_plate(&self, role: Role, plate: &str) -> Option<ConnectionEntry> {
        self.lock()
            .await
            .find_by_role_and_license_plate(role, plate)
            .cloned()
    }

    pub async fn all_except(&self, id: &ConnectionId) -> Vec<ConnectionEntry> {
        self.lock().await.all_except(id).into_iter().cloned().collect()
    }

    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.lock().await.connection_ids()
    }

    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }

    /// Drop every entry (shutdown).
    pub async fn clear(&self) {
        let mut table = self.lock().await;
        let n = table.len();
        table.clear();
        tracing::info!(removed = n, "presence registry cleared");
    }
}
