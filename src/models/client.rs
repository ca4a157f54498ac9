//! Backend model API client
//!
//! Resolves a registry entry to a concrete deployment (endpoint, key, API
//! version) and performs the HTTP call in the shape the entry demands. One
//! call per request; failures surface immediately without retries.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::registry::{ApiVersion, Invocation, ModelSpec};
use super::result::{self, ModelResult};
use crate::config::Environment;
use crate::conversation::Message;
use crate::error::{AppError, AppResult};

/// Longest upstream error body echoed back to callers
const MAX_UPSTREAM_DETAIL_CHARS: usize = 500;

/// A fully resolved backend deployment
///
/// `Debug` redacts the key.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendTarget {
    endpoint: String,
    api_key: String,
    api_version: String,
    endpoint_source: &'static str,
}

impl std::fmt::Debug for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendTarget")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("endpoint_source", &self.endpoint_source)
            .finish()
    }
}

impl BackendTarget {
    /// Resolve a model's deployment from the environment
    ///
    /// Endpoint and key each take the first set candidate key; the API
    /// version takes its override key when set, else the static default.
    pub fn resolve(model: &ModelSpec, env: &Environment) -> AppResult<Self> {
        let (endpoint_source, endpoint) = env.first_of(model.endpoint_keys()).ok_or_else(|| {
            AppError::Config(format!(
                "Server configuration error: no endpoint configured for model '{}' (checked {})",
                model.id(),
                model.endpoint_keys().join(", ")
            ))
        })?;

        let (_, api_key) = env.first_of(model.api_key_keys()).ok_or_else(|| {
            AppError::Config(format!(
                "Server configuration error: no API key configured for model '{}' (checked {})",
                model.id(),
                model.api_key_keys().join(", ")
            ))
        })?;

        let api_version = match model.api_version() {
            ApiVersion::Fixed(version) => version.to_string(),
            ApiVersion::Override { key, default } => env.get(key).unwrap_or(default).to_string(),
        };

        Ok(Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            api_version,
            endpoint_source,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Environment key the endpoint came from
    pub fn endpoint_source(&self) -> &'static str {
        self.endpoint_source
    }

    fn chat_completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, deployment
        )
    }

    fn responses_url(&self) -> String {
        format!("{}/openai/responses", self.endpoint)
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    messages: &'a [Message],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ResponsesBody<'a> {
    model: &'a str,
    input: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// HTTP client for the hosted model API
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
}

impl BackendClient {
    /// Build a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Call the backend for `model` and normalize its reply
    pub async fn dispatch(
        &self,
        model: &ModelSpec,
        target: &BackendTarget,
        messages: &[Message],
    ) -> AppResult<ModelResult> {
        let started = Instant::now();

        let outcome = match model.invocation() {
            Invocation::ChatCompletion { max_tokens } => {
                let body = ChatCompletionBody {
                    messages,
                    max_tokens,
                };
                self.post_json(target, target.chat_completions_url(model.id()), &body)
                    .await
                    .map(|v| ModelResult::Text(result::chat_completion_text(&v)))
            }
            Invocation::ResponseText { max_output_tokens } => {
                let body = ResponsesBody {
                    model: model.id(),
                    input: messages,
                    max_output_tokens: Some(max_output_tokens),
                };
                self.post_json(target, target.responses_url(), &body)
                    .await
                    .map(|v| ModelResult::Text(result::consolidated_output_text(&v)))
            }
            Invocation::ResponseMixed => {
                let body = ResponsesBody {
                    model: model.id(),
                    input: messages,
                    max_output_tokens: None,
                };
                self.post_json(target, target.responses_url(), &body)
                    .await
                    .map(|v| result::mixed_output(&v))
            }
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &outcome {
            Ok(reply) => tracing::debug!(
                model = model.id(),
                invocation = model.invocation().as_str(),
                endpoint_source = target.endpoint_source(),
                image = reply.is_image(),
                elapsed_ms = %elapsed_ms,
                "Backend call succeeded"
            ),
            Err(e) => tracing::warn!(
                model = model.id(),
                invocation = model.invocation().as_str(),
                endpoint_source = target.endpoint_source(),
                elapsed_ms = %elapsed_ms,
                error = %e,
                "Backend call failed"
            ),
        }

        outcome
    }

    async fn post_json<B: Serialize>(
        &self,
        target: &BackendTarget,
        url: String,
        body: &B,
    ) -> AppResult<Value> {
        let response = self
            .http
            .post(&url)
            .query(&[("api-version", target.api_version())])
            .header("api-key", &target.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::BackendCallFailed(describe_transport_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::BackendCallFailed(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::BackendCallFailed(describe_upstream_error(status, &text)));
        }

        serde_json::from_str(&text).map_err(|e| {
            AppError::BackendCallFailed(format!("backend returned invalid JSON: {}", e))
        })
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request to backend timed out".to_string()
    } else if error.is_connect() {
        format!("could not connect to backend: {}", error)
    } else {
        format!("request to backend failed: {}", error)
    }
}

/// Summarize a non-success backend response
///
/// Uses the API's `error.message` when the body carries one, otherwise a
/// truncated copy of the raw body.
fn describe_upstream_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(MAX_UPSTREAM_DETAIL_CHARS).collect());

    if message.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, message.trim())
    }
}
