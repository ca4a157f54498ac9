//! Integration tests for configuration loading
//!
//! Verifies that invalid configurations are rejected at startup
//! (`Config::from_file()`), with errors that name the file. Tests the full
//! path: file → parse → validate.

use modelgate::config::Config;
use modelgate::error::AppError;
use std::io::Write;
use tempfile::NamedTempFile;

/// Helper to create a temporary config file with given TOML content
fn create_temp_config(toml_content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(toml_content.as_bytes())
        .expect("Failed to write temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

#[test]
fn test_minimal_config_applies_defaults() {
    let file = create_temp_config(
        r#"
[server]
host = "127.0.0.1"
port = 8000
"#,
    );

    let config = Config::from_file(file.path()).expect("minimal config should load");
    assert_eq!(config.server.request_timeout_seconds, 120);
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn test_full_config_loads() {
    let file = create_temp_config(
        r#"
[server]
host = "0.0.0.0"
port = 9000
request_timeout_seconds = 45

[observability]
log_level = "debug"
"#,
    );

    let config = Config::from_file(file.path()).expect("config should load");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.request_timeout_seconds, 45);
    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn test_missing_file_reports_path() {
    let err = Config::from_file("/definitely/not/here/config.toml").unwrap_err();
    match err {
        AppError::ConfigFileRead { path, .. } => {
            assert_eq!(path, "/definitely/not/here/config.toml");
        }
        other => panic!("expected ConfigFileRead, got {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = create_temp_config("[server\nhost = ");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_missing_server_section_is_parse_error() {
    let file = create_temp_config("[observability]\nlog_level = \"info\"\n");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_invalid_host_rejected() {
    let file = create_temp_config(
        r#"
[server]
host = "not-an-ip"
port = 8000
"#,
    );

    let err = Config::from_file(file.path()).unwrap_err();
    match err {
        AppError::ConfigValidationFailed { reason, .. } => {
            assert!(reason.contains("not-an-ip"), "reason was: {}", reason);
        }
        other => panic!("expected ConfigValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_zero_timeout_rejected() {
    let file = create_temp_config(
        r#"
[server]
host = "127.0.0.1"
port = 8000
request_timeout_seconds = 0
"#,
    );

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
}

#[test]
fn test_excessive_timeout_rejected() {
    let file = create_temp_config(
        r#"
[server]
host = "127.0.0.1"
port = 8000
request_timeout_seconds = 601
"#,
    );

    let err = Config::from_file(file.path()).unwrap_err();
    match err {
        AppError::ConfigValidationFailed { reason, .. } => {
            assert!(reason.contains("600"), "reason was: {}", reason);
        }
        other => panic!("expected ConfigValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_unknown_log_level_rejected() {
    let file = create_temp_config(
        r#"
[server]
host = "127.0.0.1"
port = 8000

[observability]
log_level = "verbose"
"#,
    );

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
}

#[test]
fn test_error_display_names_file() {
    let file = create_temp_config(
        r#"
[server]
host = ""
port = 8000
"#,
    );

    let err = Config::from_file(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains(&file.path().display().to_string()),
        "message was: {}",
        message
    );
}
