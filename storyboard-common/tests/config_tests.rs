//! Tests for configuration resolution and graceful degradation
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate STORYBOARD_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use storyboard_common::config::{
    load_config, load_toml_config, resolve_config_path, write_toml_config, TomlConfig,
    CONFIG_ENV_VAR,
};
use storyboard_common::Error;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("from-env.toml");
    env::set_var(CONFIG_ENV_VAR, &path);

    assert_eq!(resolve_config_path(None), Some(path));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join("env.toml");
    let cli_path = temp_dir.path().join("cli.toml");
    env::set_var(CONFIG_ENV_VAR, &env_path);

    assert_eq!(resolve_config_path(Some(&cli_path)), Some(cli_path));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist.toml");

    let config = load_config(Some(&missing));
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[polling\ninterval_ms = ").unwrap();

    assert!(load_toml_config(&path).is_err());
    assert_eq!(load_config(Some(&path)), TomlConfig::default());
}

#[test]
fn test_load_errors_name_their_cause() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");
    let broken = temp_dir.path().join("broken.toml");
    std::fs::write(&broken, "max_parallel = [").unwrap();

    let err = load_toml_config(&missing).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("absent.toml"));

    let err = load_toml_config(&broken).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
    assert!(err.to_string().starts_with("TOML parse error"));
}

#[test]
fn test_write_into_file_path_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let err = write_toml_config(&TomlConfig::default(), &blocker.join("storyboard.toml"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_write_then_load_preserves_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("storyboard.toml");

    let mut config = TomlConfig::default();
    config.services.scene_splitter_url = Some("http://splitter.local/api".to_string());
    config.polling.interval_ms = 1500;
    config.polling.image_expires_seconds = Some(600);
    config.generation.max_parallel = 5;
    config.review.short_scene_threshold = 4;

    write_toml_config(&config, &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(loaded, config);
    assert!(!path.with_extension("toml.tmp").exists(), "temp file should be renamed away");
}
