//! Shared application state for the SirenLink gateway.
//!
//! Owns the one presence registry of the process and injects it into the
//! event router. Collaborators (accounts, geo) are held behind traits.

use std::sync::Arc;

use sirenlink_core::error::Result;

use crate::accounts::{InMemoryUserStore, UserStore};
use crate::config::GatewayConfig;
use crate::dispatch::EventRouter;
use crate::geo::{CachedGeo, GeoProvider, HttpGeoProvider};
use crate::obs::GatewayMetrics;
use crate::realtime::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: Arc<ConnectionRegistry>,
    router: EventRouter,
    metrics: Arc<GatewayMetrics>,
    users: Arc<dyn UserStore>,
    geo: Arc<dyn GeoProvider>,
}

impl AppState {
    /// Build state with the default collaborators (in-memory accounts,
    /// cached Overpass/OSRM lookups).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let metrics = Arc::new(GatewayMetrics::default());
        let geo = CachedGeo::new(HttpGeoProvider::new(&cfg.geo)?, &cfg.geo)
            .with_metrics(Arc::clone(&metrics));
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        Ok(Self::assemble(cfg, metrics, users, Arc::new(geo)))
    }

    /// Build state around caller-provided collaborators.
    pub fn with_collaborators(
        cfg: GatewayConfig,
        users: Arc<dyn UserStore>,
        geo: Arc<dyn GeoProvider>,
    ) -> Self {
        Self::assemble(cfg, Arc::new(GatewayMetrics::default()), users, geo)
    }

    fn assemble(
        cfg: GatewayConfig,
        metrics: Arc<GatewayMetrics>,
        users: Arc<dyn UserStore>,
        geo: Arc<dyn GeoProvider>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(cfg.dispatch.unique_license_plates));
        let router = EventRouter::new(Arc::clone(&registry));
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                router,
                metrics,
                users,
                geo,
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn router(&self) -> &EventRouter {
        &self.inner.router
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    pub fn geo(&self) -> &dyn GeoProvider {
        self.inner.geo.as_ref()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Extra gauge lines rendered with `/metrics`.
    pub async fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![(
            "sirenlink_registry_entries",
            self.inner.registry.len().await as u64,
        )]
    }

    /// Stop accepting sessions and drop all presence state.
    pub async fn shutdown(&self) {
        self.inner.metrics.set_draining();
        self.inner.registry.clear().await;
    }
}
