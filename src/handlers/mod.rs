//! HTTP request handlers for the gateway API

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::{Config, Environment};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::models::{BackendClient, ModelRegistry};
use crate::policy::AccessPolicy;

pub mod chat;
pub mod health;
pub mod metrics;
pub mod models;

/// Application state shared across all handlers
///
/// Everything here is read-only after startup. All fields are Arc'd (or
/// internally pooled) for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    env: Arc<Environment>,
    policy: Arc<AccessPolicy>,
    registry: ModelRegistry,
    backend: BackendClient,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state from configuration and an environment snapshot
    ///
    /// The access policy is derived from the environment once, here.
    pub fn new(config: Arc<Config>, env: Environment) -> AppResult<Self> {
        let policy = AccessPolicy::from_env(&env);
        Self::with_policy(config, env, policy)
    }

    /// Create state with an explicit access policy
    pub fn with_policy(
        config: Arc<Config>,
        env: Environment,
        policy: AccessPolicy,
    ) -> AppResult<Self> {
        let backend = BackendClient::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        ))?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to register metrics: {}", e)))?;

        if policy.is_open() {
            tracing::warn!("No ALLOWED_TENANT_ID or ALLOWED_USERS configured; gateway is open");
        } else {
            tracing::info!(
                tenant_restricted = policy.allowed_tenant_id().is_some(),
                allowed_user_count = policy.allowed_users().len(),
                "Access policy loaded"
            );
        }

        Ok(Self {
            config,
            env: Arc::new(env),
            policy: Arc::new(policy),
            registry: ModelRegistry,
            backend,
            metrics: Arc::new(metrics),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the gateway router with all routes and middleware
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::handler))
        .route("/api/models", get(models::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(crate::middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
