//! Health check endpoint
//!
//! Liveness for load balancers. Reports whether the shared backend is
//! configured; it never contacts the backend.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Whether the shared backend endpoint and key are configured
    pub backend_configured: bool,
}

/// GET /health handler
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            backend_configured: state.env().require_default_backend().is_ok(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_API_KEY_KEY, DEFAULT_ENDPOINT_KEY, Environment};
    use std::sync::Arc;

    fn create_test_state(env: Environment) -> AppState {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
"#;
        let config: Config = toml::from_str(toml).expect("should parse test config");
        AppState::new(Arc::new(config), env).expect("should create AppState")
    }

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let state = create_test_state(Environment::from_pairs([
            (DEFAULT_ENDPOINT_KEY, "https://x.example"),
            (DEFAULT_API_KEY_KEY, "k"),
        ]));
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert!(body.backend_configured);
    }

    #[tokio::test]
    async fn test_health_reports_missing_backend() {
        let state = create_test_state(Environment::default());
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.backend_configured);
    }
}
