//! Model listing endpoint
//!
//! GET /api/models tells clients which model ids the gateway accepts and
//! whether each produces chat text or pictures.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::handlers::AppState;
use crate::models::{DEFAULT_MODEL, ModelCategory};

/// Response for GET /api/models
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default_model: &'static str,
}

/// A single supported model
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub category: ModelCategory,
}

/// GET /api/models handler
pub async fn handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state
        .registry()
        .all()
        .iter()
        .map(|m| ModelInfo {
            id: m.id(),
            label: m.label(),
            category: m.invocation().category(),
        })
        .collect();

    Json(ModelsResponse {
        models,
        default_model: DEFAULT_MODEL,
    })
}
