use std::sync::Arc;

use sirenlink_core::error::{LookupFailure, RouteError, ValidationError};
use sirenlink_core::protocol::{
    ConnectionId, EmergencyReq, GeoPoint, InboundEvent, OutboundEvent, RegisterRoleReq, Role,
    TrafficStatusReq,
};

use crate::realtime::{Broadcaster, ConnectionRegistry, DeliveryReport, Outbox, PreparedMsg, Registration};

/// Per-connection context handed to the router with every event.
#[derive(Clone)]
pub struct ConnectionCtx {
    connection_id: ConnectionId,
    outbox: Arc<dyn Outbox>,
}

impl ConnectionCtx {
    pub fn new(connection_id: ConnectionId, outbox: Arc<dyn Outbox>) -> Self {
        Self { connection_id, outbox }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn outbox(&self) -> &Arc<dyn Outbox> {
        &self.outbox
    }
}

/// Decides, for each inbound event, who receives what.
///
/// Holds no state of its own: everything lives in the injected registry.
pub struct EventRouter {
    registry: Arc<ConnectionRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Route one inbound event from `ctx`.
    pub async fn route(&self, ctx: &ConnectionCtx, event: InboundEvent) -> Result<DeliveryReport, RouteError> {
        match event {
            InboundEvent::RegisterRole(req) => self.register_role(ctx, req).await,
            InboundEvent::Emergency(req) => self.emergency(ctx, req).await,
            InboundEvent::TrafficStatus(req) => self.traffic_status(req).await,
            InboundEvent::UpdateLocation(at) => self.update_location(ctx, at).await,
            InboundEvent::Disconnect => {
                self.disconnect(ctx.connection_id()).await;
                Ok(DeliveryReport::default())
            }
        }
    }

    /// Transport-level disconnect. Idempotent; returns whether an entry was removed.
    pub async fn disconnect(&self, conn: &ConnectionId) -> bool {
        match self.registry.remove(conn).await {
            Some(entry) => {
                tracing::info!(conn = %conn, role = %entry.role, "participant left");
                true
            }
            None => false,
        }
    }

    async fn register_role(&self, ctx: &ConnectionCtx, req: RegisterRoleReq) -> Result<DeliveryReport, RouteError> {
        let role = req.role;
        let name = req.name.clone();
        self.registry
            .register(
                ctx.connection_id().clone(),
                Registration {
                    role,
                    name: req.name,
                    license_plate: req.license_plate,
                },
                Arc::clone(ctx.outbox()),
            )
            .await?;

        tracing::info!(
            conn = %ctx.connection_id(),
            role = %role,
            name = name.as_deref().unwrap_or("-"),
            "participant registered"
        );
        Ok(DeliveryReport::default())
    }

    async fn emergency(&self, ctx: &ConnectionCtx, req: EmergencyReq) -> Result<DeliveryReport, RouteError> {
        let plate = req
            .license_plate
            .filter(|p| !p.trim().is_empty())
            .ok_or(ValidationError::MissingLicensePlate)?;

        let table = self.registry.lock().await;
        let target = table
            .find_first_by_role(Role::TrafficPolice)
            .ok_or(LookupFailure::NoResponderAvailable)?;

        let alert = PreparedMsg::prepare(&OutboundEvent::EmergencyAlert {
            license_plate: plate.clone(),
            location: req.location,
        })?;
        let police_at = PreparedMsg::prepare(&OutboundEvent::police_location(target.location))?;

        let mut report = DeliveryReport::default();
        report.record(&target.connection_id, alert.event(), target.deliver(&alert));
        report.record(ctx.connection_id(), police_at.event(), ctx.outbox().deliver(&police_at));

        tracing::info!(
            from = %ctx.connection_id(),
            responder = %target.connection_id,
            plate = %plate,
            "emergency routed"
        );
        Ok(report)
    }

    async fn traffic_status(&self, req: TrafficStatusReq) -> Result<DeliveryReport, RouteError> {
        let plate = req
            .license_plate
            .filter(|p| !p.trim().is_empty())
            .ok_or(ValidationError::MissingLicensePlate)?;

        let table = self.registry.lock().await;
        let target = table
            .find_by_role_and_license_plate(Role::AmbulanceDriver, &plate)
            .ok_or(LookupFailure::TargetNotFound)?;

        let update = PreparedMsg::prepare(&OutboundEvent::TrafficStatusUpdate { status: req.status })?;

        let mut report = DeliveryReport::default();
        report.record(&target.connection_id, update.event(), target.deliver(&update));

        tracing::debug!(target = %target.connection_id, plate = %plate, "traffic status routed");
        Ok(report)
    }

    async fn update_location(&self, ctx: &ConnectionCtx, at: GeoPoint) -> Result<DeliveryReport, RouteError> {
        let id = ctx.connection_id();
        let mut table = self.registry.lock().await;
        if !table.update_location(id, at) {
            tracing::debug!(conn = %id, "location from unregistered connection ignored");
            return Ok(DeliveryReport::default());
        }
        let Some(role) = table.get(id).map(|e| e.role) else {
            return Ok(DeliveryReport::default());
        };

        let live = PreparedMsg::prepare(&OutboundEvent::LiveLocationUpdate {
            connection_id: id.clone(),
            lat: at.lat,
            lon: at.lon,
            role,
        })?;
        Ok(Broadcaster::fan_out(&table, &live, id))
    }
}
