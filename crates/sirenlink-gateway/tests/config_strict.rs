#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sirenlink_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
geo:
  cache_ttl: 60 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:3000");
    assert_eq!(cfg.gateway.outbound_queue, 1024);
    assert!(!cfg.dispatch.unique_license_plates);
    assert_eq!(cfg.geo.search_radius_m, 5000);
    assert_eq!(cfg.geo.cache_precision, 4);
}

#[test]
fn sections_override_defaults() {
    let cfg = config::load_from_str(
        r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  allowed_origins: []
dispatch:
  unique_license_plates: true
geo:
  cache_ttl_secs: 30
"#,
    )
    .expect("must parse");
    assert_eq!(cfg.gateway.listen, "127.0.0.1:9000");
    assert!(cfg.gateway.allowed_origins.is_empty());
    assert!(cfg.dispatch.unique_license_plates);
    assert_eq!(cfg.geo.cache_ttl_secs, 30);
}

#[test]
fn unsupported_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn idle_timeout_must_exceed_ping_interval() {
    let bad = r#"
version: 1
gateway:
  ping_interval_ms: 30000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn zero_outbound_queue_is_rejected() {
    let bad = r#"
version: 1
gateway:
  outbound_queue: 0
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn cache_precision_is_bounded() {
    let bad = r#"
version: 1
geo:
  cache_precision: 9
"#;
    assert!(config::load_from_str(bad).is_err());
}
