//! Static model registry
//!
//! Each supported model declares the call shape its backend expects and the
//! ordered environment keys used to locate it. Dedicated keys come first so
//! a model can be moved to its own deployment without touching the others;
//! the shared default pair is always the last resort.

use serde::Serialize;

use crate::config::{DEFAULT_API_KEY_KEY, DEFAULT_ENDPOINT_KEY};
use crate::error::{AppError, AppResult};

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "gpt-35-turbo";

/// Token cap applied to text-producing calls
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Message returned for unknown model identifiers
pub const UNSUPPORTED_MODEL: &str = "Unsupported model.";

/// Shared API-version override key
pub const API_VERSION_KEY: &str = "AZURE_OPENAI_API_VERSION";
/// API-version override key for the image deployment
pub const IMAGE_API_VERSION_KEY: &str = "AZURE_OPENAI_IMAGE_API_VERSION";

const DEFAULT_API_VERSION: &str = "2025-03-01-preview";
const DEFAULT_IMAGE_API_VERSION: &str = "2025-04-01-preview";

/// Backend call shape
///
/// Each variant carries only what its request body needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// `chat/completions` with the full message list
    ChatCompletion { max_tokens: u32 },
    /// `responses` returning consolidated text
    ResponseText { max_output_tokens: u32 },
    /// `responses` that may return text or an image artifact
    ResponseMixed,
}

impl Invocation {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Invocation::ChatCompletion { .. } => "chat_completion",
            Invocation::ResponseText { .. } => "response_text",
            Invocation::ResponseMixed => "response_mixed",
        }
    }

    /// Display category reported by the model listing
    pub fn category(&self) -> ModelCategory {
        match self {
            Invocation::ChatCompletion { .. } | Invocation::ResponseText { .. } => {
                ModelCategory::Chat
            }
            Invocation::ResponseMixed => ModelCategory::Picture,
        }
    }
}

/// What a client should expect a model to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Chat,
    Picture,
}

/// How the `api-version` query parameter is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    Fixed(&'static str),
    Override {
        key: &'static str,
        default: &'static str,
    },
}

/// A registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    id: &'static str,
    label: &'static str,
    invocation: Invocation,
    endpoint_keys: &'static [&'static str],
    api_key_keys: &'static [&'static str],
    api_version: ApiVersion,
}

impl ModelSpec {
    /// Model (deployment) identifier
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn invocation(&self) -> Invocation {
        self.invocation
    }

    /// Candidate endpoint keys, dedicated first
    pub fn endpoint_keys(&self) -> &'static [&'static str] {
        self.endpoint_keys
    }

    /// Candidate API key keys, dedicated first
    pub fn api_key_keys(&self) -> &'static [&'static str] {
        self.api_key_keys
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }
}

const SHARED_API_VERSION: ApiVersion = ApiVersion::Override {
    key: API_VERSION_KEY,
    default: DEFAULT_API_VERSION,
};

static MODELS: [ModelSpec; 4] = [
    ModelSpec {
        id: "gpt-35-turbo",
        label: "GPT-3.5 Turbo",
        invocation: Invocation::ChatCompletion {
            max_tokens: DEFAULT_MAX_TOKENS,
        },
        endpoint_keys: &[DEFAULT_ENDPOINT_KEY],
        api_key_keys: &[DEFAULT_API_KEY_KEY],
        api_version: SHARED_API_VERSION,
    },
    ModelSpec {
        id: "gpt-5-chat",
        label: "GPT-5 Chat",
        invocation: Invocation::ResponseText {
            max_output_tokens: DEFAULT_MAX_TOKENS,
        },
        endpoint_keys: &["AZURE_OPENAI_GPT5_ENDPOINT", DEFAULT_ENDPOINT_KEY],
        api_key_keys: &["AZURE_OPENAI_GPT5_KEY", DEFAULT_API_KEY_KEY],
        api_version: SHARED_API_VERSION,
    },
    ModelSpec {
        id: "model-router",
        label: "Model Router",
        invocation: Invocation::ResponseText {
            max_output_tokens: DEFAULT_MAX_TOKENS,
        },
        endpoint_keys: &["AZURE_OPENAI_ROUTER_ENDPOINT", DEFAULT_ENDPOINT_KEY],
        api_key_keys: &["AZURE_OPENAI_ROUTER_KEY", DEFAULT_API_KEY_KEY],
        api_version: SHARED_API_VERSION,
    },
    ModelSpec {
        id: "FLUX.1-Kontext-pro",
        label: "FLUX.1 Kontext Pro",
        invocation: Invocation::ResponseMixed,
        endpoint_keys: &["AZURE_OPENAI_IMAGE_ENDPOINT", DEFAULT_ENDPOINT_KEY],
        api_key_keys: &["AZURE_OPENAI_IMAGE_KEY", DEFAULT_API_KEY_KEY],
        api_version: ApiVersion::Override {
            key: IMAGE_API_VERSION_KEY,
            default: DEFAULT_IMAGE_API_VERSION,
        },
    },
];

/// Read-only view over the fixed model table
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRegistry;

impl ModelRegistry {
    /// All registered models in display order
    pub fn all(&self) -> &'static [ModelSpec] {
        &MODELS
    }

    /// Exact-match lookup
    pub fn get(&self, id: &str) -> Option<&'static ModelSpec> {
        MODELS.iter().find(|m| m.id == id)
    }

    /// Lookup that reports an unknown id as a client error
    pub fn resolve(&self, id: &str) -> AppResult<&'static ModelSpec> {
        self.get(id)
            .ok_or_else(|| AppError::Validation(UNSUPPORTED_MODEL.to_string()))
    }
}
