//! Error types for modelgate
//!
//! All errors implement `IntoResponse` for Axum handlers. Every failure body
//! carries an `error` field; tenant mismatches additionally report the expected
//! and actual tenant so operators can diagnose misconfigured allow-lists.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message returned for faults the caller cannot act on
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred processing your request.";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Access denied: {reason}")]
    AccessDenied {
        reason: String,
        expected_tenant: Option<String>,
        actual_tenant: Option<String>,
    },

    #[error("Backend call failed: {0}")]
    BackendCallFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::BackendCallFailed(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Validation(msg) | Self::Config(msg) => serde_json::json!({ "error": msg }),
            Self::AccessDenied {
                reason,
                expected_tenant,
                actual_tenant,
            } => {
                let mut body = serde_json::json!({ "error": reason });
                if let (Some(expected), Some(actual)) = (expected_tenant, actual_tenant) {
                    body["expectedTenant"] = serde_json::Value::from(expected.as_str());
                    body["actualTenant"] = serde_json::Value::from(actual.as_str());
                }
                body
            }
            Self::BackendCallFailed(_) => serde_json::json!({ "error": self.to_string() }),
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => {
                serde_json::json!({ "error": self.to_string() })
            }
            Self::Internal(detail) => {
                // Detail stays in the logs, never in the response body
                tracing::error!(detail = %detail, "Unexpected internal failure");
                serde_json::json!({ "error": GENERIC_FAILURE_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("AZURE_OPENAI_KEY is not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: AZURE_OPENAI_KEY is not set"
        );
    }

    #[test]
    fn test_validation_error_creates() {
        let err = AppError::Validation("Unsupported model.".to_string());
        assert_eq!(err.to_string(), "Invalid request: Unsupported model.");
    }

    #[test]
    fn test_backend_error_creates() {
        let err = AppError::BackendCallFailed("HTTP 429: rate limited".to_string());
        assert_eq!(err.to_string(), "Backend call failed: HTTP 429: rate limited");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Config("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::BackendCallFailed("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::AccessDenied {
                reason: "x".into(),
                expected_tenant: None,
                actual_tenant: None,
            }
            .status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_validation_body_is_bare_message() {
        let response = AppError::Validation("Unsupported model.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "error": "Unsupported model." }));
    }

    #[tokio::test]
    async fn test_tenant_mismatch_body_reports_both_tenants() {
        let response = AppError::AccessDenied {
            reason: "Access denied. Wrong tenant.".to_string(),
            expected_tenant: Some("tenant-a".to_string()),
            actual_tenant: Some("tenant-b".to_string()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Access denied. Wrong tenant.");
        assert_eq!(body["expectedTenant"], "tenant-a");
        assert_eq!(body["actualTenant"], "tenant-b");
    }

    #[tokio::test]
    async fn test_plain_denial_has_no_tenant_fields() {
        let response = AppError::AccessDenied {
            reason: "Access denied. Your account is not authorized.".to_string(),
            expected_tenant: None,
            actual_tenant: None,
        }
        .into_response();

        let body = body_json(response).await;
        assert!(body.get("expectedTenant").is_none());
        assert!(body.get("actualTenant").is_none());
    }

    #[tokio::test]
    async fn test_backend_error_includes_upstream_detail() {
        let response =
            AppError::BackendCallFailed("HTTP 404: DeploymentNotFound".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("DeploymentNotFound"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = AppError::Internal("panic in serializer at foo.rs:12".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], GENERIC_FAILURE_MESSAGE);
    }
}
