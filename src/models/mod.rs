//! Model registry and backend dispatch
//!
//! `registry` names the supported models and how to reach them, `client`
//! performs the backend call, and `result` normalizes what comes back.

pub mod client;
pub mod registry;
pub mod result;

pub use client::{BackendClient, BackendTarget};
pub use registry::{DEFAULT_MODEL, Invocation, ModelCategory, ModelRegistry, ModelSpec};
pub use result::ModelResult;
