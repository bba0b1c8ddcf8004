use serde::Deserialize;
use sirenlink_core::error::{Result, SirenError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub dispatch: DispatchSection,

    #[serde(default)]
    pub geo: GeoSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            dispatch: DispatchSection::default(),
            geo: GeoSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SirenError::UnsupportedVersion);
        }
        self.gateway.validate()?;
        self.geo.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-connection outbound queue capacity (frames).
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// CORS origins for the HTTP API. Empty means no CORS layer.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SirenError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SirenError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SirenError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(SirenError::BadRequest(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    1024
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Reject an ambulance registration whose plate is already held by
    /// another live ambulance connection.
    #[serde(default)]
    pub unique_license_plates: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoSection {
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,

    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,

    #[serde(default = "default_search_radius_m")]
    pub search_radius_m: u32,

    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Decimal places kept when building cache keys.
    #[serde(default = "default_cache_precision")]
    pub cache_precision: u32,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for GeoSection {
    fn default() -> Self {
        Self {
            overpass_url: default_overpass_url(),
            osrm_url: default_osrm_url(),
            search_radius_m: default_search_radius_m(),
            timeout_ms: default_geo_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_precision: default_cache_precision(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl GeoSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=50000).contains(&self.search_radius_m) {
            return Err(SirenError::BadRequest(
                "geo.search_radius_m must be between 100 and 50000".into(),
            ));
        }
        if !(1000..=60000).contains(&self.timeout_ms) {
            return Err(SirenError::BadRequest(
                "geo.timeout_ms must be between 1000 and 60000".into(),
            ));
        }
        if !(1..=86400).contains(&self.cache_ttl_secs) {
            return Err(SirenError::BadRequest(
                "geo.cache_ttl_secs must be between 1 and 86400".into(),
            ));
        }
        if self.cache_precision > 6 {
            return Err(SirenError::BadRequest(
                "geo.cache_precision must be at most 6".into(),
            ));
        }
        if self.cache_max_entries == 0 {
            return Err(SirenError::BadRequest(
                "geo.cache_max_entries must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".into()
}
fn default_osrm_url() -> String {
    "http://router.project-osrm.org".into()
}
fn default_search_radius_m() -> u32 {
    5000
}
fn default_geo_timeout_ms() -> u64 {
    10000
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_cache_precision() -> u32 {
    4
}
fn default_cache_max_entries() -> usize {
    1024
}
