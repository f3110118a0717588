//! Configuration loading tests
//!
//! Tests cover:
//! - Missing TOML files fall back to compiled defaults
//! - TOML values are read from an explicit path or `XTREND_CONFIG`
//! - Environment variables override TOML values
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.

use serial_test::serial;
use std::env;
use std::io::Write;
use xtrend_common::config::{resolve_config_path, DataSourceKind, ServiceConfig, CONFIG_PATH_ENV};

const ENV_KEYS: &[&str] = &[
    CONFIG_PATH_ENV,
    "USE_DATA_SOURCE",
    "X_BEARER_TOKEN",
    "X_API_KEY",
    "X_API_SECRET",
    "X_API_BASE_URL",
    "MCP_SERVER_URL",
    "XTREND_PORT",
    "XTREND_LOG_LEVEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let config = ServiceConfig::load(Some(&path)).expect("missing file is not an error");

    assert_eq!(config.port, 3000);
    assert_eq!(config.data_source_kind(), DataSourceKind::Mock);
}

#[test]
#[serial]
fn test_explicit_path_is_loaded() {
    clear_env();
    let file = write_config(
        r#"
        port = 8123
        data_source = "mcp"

        [mcp]
        server_url = "http://localhost:3001"

        [retry]
        max_attempts = 5
        "#,
    );

    let config = ServiceConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.port, 8123);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.data_source_kind(), DataSourceKind::Mcp);
}

#[test]
#[serial]
fn test_config_env_var_names_file() {
    clear_env();
    let file = write_config("port = 9001\n");
    env::set_var(CONFIG_PATH_ENV, file.path());

    assert_eq!(resolve_config_path(None).as_deref(), Some(file.path()));
    let config = ServiceConfig::load(None).unwrap();
    assert_eq!(config.port, 9001);

    clear_env();
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = write_config(
        r#"
        port = 8123
        [x_api]
        bearer_token = "toml-token"
        "#,
    );
    env::set_var("XTREND_PORT", "8200");
    env::set_var("X_BEARER_TOKEN", "env-token");

    let config = ServiceConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.port, 8200);
    assert_eq!(config.x_api.bearer_token.as_deref(), Some("env-token"));
    assert_eq!(config.data_source_kind(), DataSourceKind::XApi);

    clear_env();
}

#[test]
#[serial]
fn test_malformed_file_is_error() {
    clear_env();
    let file = write_config("port = [this is not toml");

    assert!(ServiceConfig::load(Some(file.path())).is_err());
}
