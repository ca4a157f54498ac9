//! Chat endpoint handler
//!
//! Handles POST /api/chat. Per request, short-circuiting on the first failure:
//!
//! 1. Check the shared backend configuration is present (500 otherwise)
//! 2. Resolve identity and evaluate the access policy (403 on denial)
//! 3. Parse and validate the payload (400)
//! 4. Assemble messages and call the backend (500 on backend failure)
//! 5. Return the normalized reply with the extended history
//!
//! The body is parsed only after the policy check, so callers who are not
//! allowed in learn nothing about payload validation.

use axum::{Extension, Json, body::Bytes, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::conversation::{
    HistoryEntry, IMAGE_PLACEHOLDER, build_request_messages, build_updated_history,
};
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::identity;
use crate::metrics::{Outcome, UNKNOWN_MODEL};
use crate::middleware::RequestId;
use crate::models::{BackendTarget, DEFAULT_MODEL, ModelResult, ModelSpec};

/// Wire form of the request body before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChatRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default, alias = "history")]
    conversation_history: Option<Vec<HistoryEntry>>,
}

/// Validated chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    prompt: String,
    model: String,
    conversation_history: Vec<HistoryEntry>,
}

impl TryFrom<RawChatRequest> for ChatRequest {
    type Error = String;

    fn try_from(raw: RawChatRequest) -> Result<Self, Self::Error> {
        let prompt = raw.prompt.as_deref().map(str::trim).unwrap_or_default();
        if prompt.is_empty() {
            return Err("Prompt is required.".to_string());
        }

        let model = raw
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL);

        Ok(Self {
            prompt: prompt.to_string(),
            model: model.to_string(),
            conversation_history: raw.conversation_history.unwrap_or_default(),
        })
    }
}

impl ChatRequest {
    /// Parse and validate a JSON request body
    pub fn from_json(body: &[u8]) -> AppResult<Self> {
        let raw: RawChatRequest = serde_json::from_slice(body).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                AppError::Validation("Invalid JSON payload.".to_string())
            } else {
                AppError::Validation(format!("Invalid request payload: {}", e))
            }
        })?;
        Self::try_from(raw).map_err(AppError::Validation)
    }

    /// The trimmed prompt
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The requested model id (default applied)
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Caller-supplied history, as received
    pub fn conversation_history(&self) -> &[HistoryEntry] {
        &self.conversation_history
    }
}

/// Kind of reply produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    Text,
    Image,
}

/// Successful chat response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub reply_type: ReplyType,
    pub image_url: Option<String>,
    pub conversation_history: Vec<HistoryEntry>,
}

impl ChatResponse {
    /// Build the response for a backend result
    pub fn new(request: &ChatRequest, result: &ModelResult) -> Self {
        let conversation_history =
            build_updated_history(request.conversation_history(), request.prompt(), result);

        match result {
            ModelResult::Text(text) => Self {
                reply: text.clone(),
                reply_type: ReplyType::Text,
                image_url: None,
                conversation_history,
            },
            ModelResult::Image { url } => Self {
                reply: IMAGE_PLACEHOLDER.to_string(),
                reply_type: ReplyType::Image,
                image_url: Some(url.clone()),
                conversation_history,
            },
        }
    }
}

/// POST /api/chat handler
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ChatResponse>> {
    let mut model: Option<&'static ModelSpec> = None;
    let outcome = process(&state, request_id, &headers, &body, &mut model).await;

    let label = model.map(ModelSpec::id).unwrap_or(UNKNOWN_MODEL);
    state.metrics().record_request(label, outcome_of(&outcome));

    if let Err(e) = &outcome {
        tracing::info!(
            request_id = %request_id,
            model = label,
            status = e.status().as_u16(),
            error = %e,
            "Chat request failed"
        );
    }

    outcome.map(Json)
}

async fn process(
    state: &AppState,
    request_id: RequestId,
    headers: &HeaderMap,
    body: &[u8],
    model_slot: &mut Option<&'static ModelSpec>,
) -> AppResult<ChatResponse> {
    state.env().require_default_backend().inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Backend configuration missing");
    })?;

    let claims = identity::extract_claims_traced(headers, Some(request_id));
    let decision = state.policy().evaluate(&claims);
    if let Some(rule) = decision.rule {
        state.metrics().record_denial(rule);
        tracing::warn!(
            request_id = %request_id,
            rule = rule.as_str(),
            tenant = ?claims.tenant_id,
            user = ?claims.user,
            "Access denied"
        );
    }
    decision.into_result()?;

    let request = ChatRequest::from_json(body)?;
    let model = state.registry().resolve(request.model())?;
    *model_slot = Some(model);

    tracing::debug!(
        request_id = %request_id,
        model = model.id(),
        invocation = model.invocation().as_str(),
        prompt_chars = request.prompt().chars().count(),
        history_len = request.conversation_history().len(),
        "Received chat request"
    );

    let target = BackendTarget::resolve(model, state.env())?;
    let messages = build_request_messages(request.conversation_history(), request.prompt());

    let started = Instant::now();
    let dispatched = state.backend().dispatch(model, &target, &messages).await;
    state
        .metrics()
        .record_backend_duration(model.invocation(), started.elapsed().as_secs_f64() * 1000.0);
    let result = dispatched?;

    let response = ChatResponse::new(&request, &result);
    tracing::info!(
        request_id = %request_id,
        model = model.id(),
        reply_type = ?response.reply_type,
        history_len = response.conversation_history.len(),
        "Chat request completed"
    );
    Ok(response)
}

fn outcome_of(result: &AppResult<ChatResponse>) -> Outcome {
    match result {
        Ok(_) => Outcome::Success,
        Err(AppError::AccessDenied { .. }) => Outcome::Denied,
        Err(AppError::Validation(_)) => Outcome::Invalid,
        Err(
            AppError::Config(_)
            | AppError::ConfigFileRead { .. }
            | AppError::ConfigParseFailed { .. }
            | AppError::ConfigValidationFailed { .. },
        ) => Outcome::ConfigError,
        Err(AppError::BackendCallFailed(_)) => Outcome::BackendError,
        Err(AppError::Internal(_)) => Outcome::InternalError,
    }
}
