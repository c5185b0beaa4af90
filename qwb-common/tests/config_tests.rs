//! Integration tests for configuration loading and resolution
//!
//! Covers:
//! - Missing TOML file → warning + defaults (no termination)
//! - Malformed TOML file → error
//! - Priority order CLI → ENV → TOML → compiled default
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that touch QWB_* variables are marked with #[serial].

use qwb_common::config::{
    load_config, resolve_config_path, ApiSettings, TomlConfig, API_TOKEN_ENV_VAR,
    API_URL_ENV_VAR, CONFIG_ENV_VAR, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(API_URL_ENV_VAR);
    env::remove_var(API_TOKEN_ENV_VAR);
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_file_uses_defaults() {
    let config = TomlConfig::load(std::path::Path::new("/nonexistent/qwb/config.toml")).unwrap();
    assert!(config.api.base_url.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_file_is_error() {
    let file = write_config("[api]\nbase_url = ");
    let result = TomlConfig::load(file.path());
    assert!(result.is_err());
}

#[test]
fn test_full_file_is_loaded() {
    let file = write_config(
        r#"
        [api]
        base_url = "https://qa.example.com"
        token = "secret-token"
        timeout_secs = 5

        [logging]
        level = "debug"
        "#,
    );
    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.api.base_url.as_deref(), Some("https://qa.example.com"));
    assert_eq!(config.api.token.as_deref(), Some("secret-token"));
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_cli_path_beats_env_path() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/qwb-from-env.toml");

    let cli = std::path::PathBuf::from("/tmp/qwb-from-cli.toml");
    let resolved = resolve_config_path(Some(&cli));
    assert_eq!(resolved, Some(cli));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    let file = write_config("[logging]\nlevel = \"warn\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = load_config(None).unwrap();
    assert_eq!(config.logging.level, "warn");

    clear_env();
}

#[test]
#[serial]
fn test_api_settings_compiled_defaults() {
    clear_env();
    let settings = ApiSettings::resolve(None, None, &TomlConfig::default());
    assert_eq!(settings.base_url, DEFAULT_API_URL);
    assert!(settings.token.is_none());
    assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
}

#[test]
#[serial]
fn test_api_settings_priority_order() {
    clear_env();
    let config = TomlConfig::from_toml_str(
        r#"
        [api]
        base_url = "http://from-toml:8080"
        token = "toml-token"
        "#,
    )
    .unwrap();

    // TOML only
    let settings = ApiSettings::resolve(None, None, &config);
    assert_eq!(settings.base_url, "http://from-toml:8080");
    assert_eq!(settings.token.as_deref(), Some("toml-token"));

    // ENV beats TOML
    env::set_var(API_URL_ENV_VAR, "http://from-env:8080/");
    env::set_var(API_TOKEN_ENV_VAR, "env-token");
    let settings = ApiSettings::resolve(None, None, &config);
    assert_eq!(settings.base_url, "http://from-env:8080");
    assert_eq!(settings.token.as_deref(), Some("env-token"));

    // CLI beats ENV
    let settings = ApiSettings::resolve(Some("http://from-cli:9000"), Some("cli-token"), &config);
    assert_eq!(settings.base_url, "http://from-cli:9000");
    assert_eq!(settings.token.as_deref(), Some("cli-token"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    clear_env();
    env::set_var(API_URL_ENV_VAR, "   ");
    let settings = ApiSettings::resolve(None, None, &TomlConfig::default());
    assert_eq!(settings.base_url, DEFAULT_API_URL);
    clear_env();
}
