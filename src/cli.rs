//! Command-line interface for modelgate
//!
//! Provides argument parsing and subcommand handling for the modelgate binary.

use clap::{Parser, Subcommand};

/// Identity-aware routing gateway for hosted LLM deployments
#[derive(Parser)]
#[command(name = "modelgate")]
#[command(version)]
#[command(about = "Identity-aware routing gateway for hosted LLM deployments")]
#[command(
    long_about = "modelgate resolves caller identity from platform-injected headers, \
    enforces tenant and user allow-lists, and routes chat requests to the configured \
    model deployment."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# modelgate configuration
# =======================
#
# Server and logging settings live here. Backend endpoints, API keys and
# access allow-lists come from the environment so secrets stay out of files:
#
#   AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_KEY      shared default deployment (required)
#   AZURE_OPENAI_API_VERSION                     API version override
#   AZURE_OPENAI_GPT5_ENDPOINT / _GPT5_KEY       dedicated gpt-5-chat deployment
#   AZURE_OPENAI_ROUTER_ENDPOINT / _ROUTER_KEY   dedicated model-router deployment
#   AZURE_OPENAI_IMAGE_ENDPOINT / _IMAGE_KEY     dedicated image deployment
#   AZURE_OPENAI_IMAGE_API_VERSION               image API version override
#   ALLOWED_TENANT_ID                            restrict to one tenant
#   ALLOWED_USERS                                comma-separated user allow-list

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8000

# Outbound timeout for each backend model call, in seconds (1-600)
request_timeout_seconds = 120

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
