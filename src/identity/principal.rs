//! Signed-in principal blob parsing
//!
//! The platform forwards the authenticated user as base64-encoded JSON. Two
//! layouts exist in the wild: App Service (`auth_typ`, claims as `typ`/`val`)
//! and Static Web Apps (`identityProvider`, `userDetails`, claims as
//! `type`/`value`). Both are read through [`ClientPrincipal`].

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{IdentityClaims, tenant_from_issuer};
use crate::shared::lookup::first_present;

/// Tenant claim keys, most specific first
pub const TENANT_CLAIM_KEYS: [&str; 3] = [
    "tid",
    "http://schemas.microsoft.com/identity/claims/tenantid",
    "tenantid",
];

/// User claim keys, most specific first
pub const USER_CLAIM_KEYS: [&str; 5] = [
    "preferred_username",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/upn",
    "upn",
    "email",
    "name",
];

/// Issuer claim key
pub const ISSUER_CLAIM_KEY: &str = "iss";

/// Top-level provider label keys (Static Web Apps, then App Service)
pub const PROVIDER_KEYS: [&str; 2] = ["identityProvider", "auth_typ"];

/// Top-level tenant key, consulted after the tenant claims
pub const TOP_LEVEL_TENANT_KEY: &str = "tid";

/// Top-level user key, consulted after the user claims
pub const USER_DETAILS_KEY: &str = "userDetails";

const CLAIM_TYPE_KEYS: [&str; 2] = ["typ", "type"];
const CLAIM_VALUE_KEYS: [&str; 2] = ["val", "value"];

/// Decoded client principal
///
/// Kept as a loose JSON object: fields and claims are read individually, so
/// one oddly typed value (a numeric `exp` claim, say) costs only that value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ClientPrincipal {
    fields: Map<String, Value>,
}

impl ClientPrincipal {
    /// Non-blank string value of a top-level field
    pub fn field(&self, key: &str) -> Option<&str> {
        non_blank(self.fields.get(key)?)
    }

    /// Value of the first string-valued claim with type `key`
    pub fn claim(&self, key: &str) -> Option<&str> {
        self.fields
            .get("claims")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|claim| {
                first_present(&CLAIM_TYPE_KEYS, |k| claim.get(k)?.as_str()) == Some(key)
            })
            .find_map(|claim| first_present(&CLAIM_VALUE_KEYS, |k| non_blank(claim.get(k)?)))
    }

    /// Identity provider label, if asserted
    pub fn identity_provider(&self) -> Option<&str> {
        first_present(&PROVIDER_KEYS, |k| self.field(k))
    }

    /// Map the principal onto identity claims
    pub fn to_claims(&self) -> IdentityClaims {
        let tenant_id = first_present(&TENANT_CLAIM_KEYS, |k| self.claim(k))
            .or_else(|| self.field(TOP_LEVEL_TENANT_KEY))
            .map(str::to_string)
            .or_else(|| self.claim(ISSUER_CLAIM_KEY).and_then(tenant_from_issuer));

        let user = first_present(&USER_CLAIM_KEYS, |k| self.claim(k))
            .or_else(|| self.field(USER_DETAILS_KEY))
            .map(str::to_string);

        IdentityClaims {
            tenant_id,
            user,
            identity_provider: self.identity_provider().map(str::to_string),
        }
    }
}

fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// Decode a principal header value
///
/// Returns `None` unless the value is base64 of a JSON object.
pub fn decode_principal(raw: &str) -> Option<ClientPrincipal> {
    let raw = raw.trim();
    let bytes = STANDARD
        .decode(raw)
        .or_else(|_| URL_SAFE_NO_PAD.decode(raw.trim_end_matches('=')))
        .map_err(|e| tracing::debug!(error = %e, "Principal header is not valid base64"))
        .ok()?;

    serde_json::from_slice(&bytes)
        .map_err(|e| tracing::debug!(error = %e, "Principal header is not a JSON object"))
        .ok()
}

/// Decode a principal header value straight into identity claims
pub fn claims_from_principal(raw: &str) -> IdentityClaims {
    decode_principal(raw)
        .map(|p| p.to_claims())
        .unwrap_or_default()
}
