//! Integration tests for settings loading and graceful degradation
//!
//! Tests that manipulate SAB_CONFIG are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use sab_common::config::{
    config_file_path, load_toml_config, load_toml_config_or_default, TomlConfig, CONFIG_ENV_VAR,
};
use sab_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [bridge]
        host = "0.0.0.0"
        port = 8099
        history_capacity = 50
        read_timeout_ms = 500
        data_dir = "/srv/measurements"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.bridge.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.bridge.port, Some(8099));
    assert_eq!(config.bridge.history_capacity, Some(50));
    assert_eq!(config.bridge.read_timeout_ms, Some(500));
    assert_eq!(config.bridge.data_dir, Some(PathBuf::from("/srv/measurements")));
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
}

#[test]
fn test_malformed_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[bridge]\nport = \"not a number\"\n").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_missing_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let config = load_toml_config_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let config = load_toml_config_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_env_var_overrides_config_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/sab-test/config.toml");
    let path = config_file_path();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(path, Some(PathBuf::from("/tmp/sab-test/config.toml")));
}

#[test]
#[serial]
fn test_default_config_path_under_config_dir() {
    env::remove_var(CONFIG_ENV_VAR);
    if let Some(path) = config_file_path() {
        assert!(path.ends_with("sab/config.toml"));
    }
}
