//! Bearer token payload parsing
//!
//! Only the payload segment is read. Signatures are not verified here: the
//! platform's authentication layer validated the token before injecting it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::{Map, Value};

use super::{IdentityClaims, tenant_from_issuer};
use crate::shared::lookup::first_present;

/// User claim keys in a token payload, most specific first
pub const TOKEN_USER_KEYS: [&str; 3] = ["preferred_username", "upn", "email"];

/// Decode the payload (middle) segment of a JWT into a JSON object
///
/// Requires at least two dot-delimited segments. Missing base64 padding is
/// restored before decoding.
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.trim().split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);

    let bytes = URL_SAFE
        .decode(pad_base64(payload))
        .map_err(|e| tracing::debug!(error = %e, "Token payload is not valid base64url"))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::debug!("Token payload is JSON but not an object");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token payload is not valid JSON");
            None
        }
    }
}

/// Map a raw token onto identity claims
pub fn claims_from_token(token: &str) -> IdentityClaims {
    let Some(payload) = decode_payload(token) else {
        return IdentityClaims::default();
    };

    let string_claim = |key: &str| payload.get(key).and_then(Value::as_str);

    let tenant_id = string_claim("tid")
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .or_else(|| string_claim("iss").and_then(tenant_from_issuer));

    let user = first_present(&TOKEN_USER_KEYS, string_claim).map(str::to_string);

    IdentityClaims {
        tenant_id,
        user,
        identity_provider: None,
    }
}

/// Restore `=` padding so the length is a multiple of four
fn pad_base64(segment: &str) -> String {
    let trimmed = segment.trim_end_matches('=');
    let mut padded = trimmed.to_string();
    let remainder = trimmed.len() % 4;
    if remainder != 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }
    padded
}
