//! Shared utilities used across multiple modules
//!
//! The ordered-fallback lookup here backs both claim extraction
//! (tenant and user chains) and backend configuration key resolution.

pub mod lookup;
