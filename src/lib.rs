//! modelgate - identity-aware routing gateway for hosted LLM deployments
//!
//! Resolves caller identity from platform-injected headers, enforces tenant
//! and user allow-lists, and dispatches chat requests to the backend
//! deployment registered for the requested model.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod shared;
pub mod telemetry;
