//! Configuration management for modelgate
//!
//! Two layers feed the gateway:
//!
//! - A TOML file (`config.toml`) with server and observability settings.
//! - The process environment, captured once at startup into [`Environment`],
//!   holding backend endpoints, API keys, API-version overrides and the
//!   access allow-lists. Secrets never live in the TOML file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::shared::lookup::first_present_keyed;

/// Shared default backend endpoint
pub const DEFAULT_ENDPOINT_KEY: &str = "AZURE_OPENAI_ENDPOINT";
/// Shared default backend API key
pub const DEFAULT_API_KEY_KEY: &str = "AZURE_OPENAI_KEY";
/// Tenant allow-list
pub const ALLOWED_TENANT_ID_KEY: &str = "ALLOWED_TENANT_ID";
/// Comma-separated user allow-list
pub const ALLOWED_USERS_KEY: &str = "ALLOWED_USERS";

/// Upper bound for the outbound request timeout
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 600;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Timeout applied by the outbound HTTP client to each backend call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    120
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()`; call it explicitly when building a `Config`
    /// by other means (e.g., in tests).
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config(
                "server.host cannot be empty (use 0.0.0.0 for all interfaces)".to_string(),
            ));
        }

        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(AppError::Config(format!(
                "server.host '{}' is not a valid IP address",
                self.server.host
            )));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.server.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds cannot exceed {} seconds, got {}",
                MAX_REQUEST_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.observability.log_level.to_ascii_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' is invalid, expected one of: {}",
                self.observability.log_level,
                LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Snapshot of the process environment
///
/// Captured once at startup and shared read-only across requests. Blank
/// values count as unset, so `AZURE_OPENAI_GPT5_ENDPOINT=""` falls through to
/// the shared default exactly like an absent variable.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a single key, treating blank values as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Look up the first set key among `keys`, reporting which key matched
    pub fn first_of<'k>(&self, keys: &'k [&'k str]) -> Option<(&'k str, &str)> {
        first_present_keyed(keys, |k| self.get(k))
    }

    /// Verify the shared default backend pair is present
    ///
    /// Every model falls back to this pair, so a deployment without it is
    /// broken regardless of which model a caller asks for.
    pub fn require_default_backend(&self) -> AppResult<()> {
        let missing: Vec<&str> = [DEFAULT_ENDPOINT_KEY, DEFAULT_API_KEY_KEY]
            .into_iter()
            .filter(|key| self.get(key).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "Server configuration error: missing {}",
                missing.join(", ")
            )))
        }
    }
}
