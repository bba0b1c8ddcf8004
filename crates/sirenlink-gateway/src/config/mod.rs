//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use sirenlink_core::error::{Result, SirenError};

pub use schema::{DispatchSection, GatewayConfig, GatewaySection, GeoSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SIRENLINK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "sirenlink.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SirenError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SirenError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve config from `SIRENLINK_CONFIG`, falling back to `sirenlink.yaml`.
///
/// A missing default file yields built-in defaults; a missing file named
/// explicitly through the environment is an error.
pub fn load_from_env() -> Result<GatewayConfig> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_from_file(&path);
    }
    match fs::read_to_string(DEFAULT_CONFIG_PATH) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = DEFAULT_CONFIG_PATH, "config file not found, using defaults");
            Ok(GatewayConfig::default())
        }
        Err(e) => Err(SirenError::Internal(format!(
            "read config failed ({DEFAULT_CONFIG_PATH}): {e}"
        ))),
    }
}
