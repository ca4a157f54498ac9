//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Default filter directive for a configured log level
pub fn default_filter(level: &str) -> String {
    format!("modelgate={},tower_http=debug", level.to_ascii_lowercase())
}

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process takes effect. `RUST_LOG` overrides the
/// configured level.
///
/// # Examples
///
/// ```no_run
/// modelgate::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_crate() {
        assert_eq!(default_filter("DEBUG"), "modelgate=debug,tower_http=debug");
    }

    #[test]
    fn test_default_filter_parses() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(EnvFilter::try_new(default_filter(level)).is_ok());
        }
    }
}
