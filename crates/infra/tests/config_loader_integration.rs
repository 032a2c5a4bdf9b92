//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from it.

use std::time::Duration;

use chainscan_infra::config;
use chainscan_infra::{ChainScanClient, ChainScanError, OverflowBehavior};
use tempfile::TempDir;

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("chainscan.json");
    std::fs::write(
        &path,
        r#"{
            "api_key": "integration-key",
            "base_url": "http://127.0.0.1:9/api",
            "default_chain_id": "8453",
            "default_overflow": "skip",
            "rate_limits": [
                {"capacity": 5, "period_ms": 1000},
                {"capacity": 100000, "period_ms": 86400000}
            ],
            "timeout_secs": 10,
            "transport_attempts": 2,
            "retry_delay_ms": 50,
            "throttle_attempts": 4,
            "throttle_delay_ms": 25
        }"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load config from JSON");

    assert_eq!(config.api_key, "integration-key");
    assert_eq!(config.base_url, "http://127.0.0.1:9/api");
    assert_eq!(config.default_chain_id, "8453");
    assert_eq!(config.default_overflow, Some(OverflowBehavior::Skip));
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.transport_attempts, 2);
    assert_eq!(config.retry_delay(), Duration::from_millis(50));
    assert_eq!(config.throttle_attempts, 4);
    assert_eq!(config.throttle_delay(), Duration::from_millis(25));

    let windows = config.windows().expect("windows");
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[1].capacity(), 100_000);
    assert_eq!(windows[1].period(), Duration::from_secs(86_400));
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("chainscan.toml");
    std::fs::write(
        &path,
        r#"
api_key = "integration-key"
default_overflow = "raise"

[[rate_limits]]
capacity = 2
period_ms = 500
"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load config from TOML");
    assert_eq!(config.default_overflow, Some(OverflowBehavior::Raise));
    assert_eq!(config.rate_limits.len(), 1);
    assert_eq!(config.rate_limits[0].capacity, 2);
}

#[test]
fn test_load_config_with_minimal_fields() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_key = \"only-key\"\n").expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load minimal config");
    assert_eq!(config.base_url, "https://api.etherscan.io/v2/api");
    assert_eq!(config.default_chain_id, "1");
    assert_eq!(config.default_overflow, None);
    assert_eq!(config.transport_attempts, 3);
    assert_eq!(config.throttle_attempts, 3);

    let client = ChainScanClient::new(config).expect("client from minimal config");
    assert_eq!(client.limiter().available(), vec![5]);
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = config::load_from_file(Some(dir.path().join("missing.toml")));
    assert!(matches!(result, Err(ChainScanError::Config(_))));
}

#[test]
fn test_load_config_with_invalid_format() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("chainscan.json");
    std::fs::write(&path, r#"{ "api_key": "k", "rate_limits": "#).expect("Failed to write");

    let result = config::load_from_file(Some(path));
    match result {
        Err(ChainScanError::Config(message)) => assert!(message.contains("JSON")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_window() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("chainscan.toml");
    std::fs::write(
        &path,
        r#"
api_key = "k"

[[rate_limits]]
capacity = 0
period_ms = 1000
"#,
    )
    .expect("Failed to write");

    assert!(matches!(config::load_from_file(Some(path)), Err(ChainScanError::Config(_))));
}
