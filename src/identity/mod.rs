//! Caller identity resolution
//!
//! The hosting platform injects identity in several inconsistent shapes:
//!
//! - `x-ms-client-principal`: base64 JSON describing the signed-in user
//!   (claims as `{typ, val}` or `{type, value}` pairs plus top-level fields)
//! - `x-ms-token-aad-id-token` / `x-ms-token-aad-access-token`: raw JWTs
//! - `Authorization: Bearer <jwt>` when a client calls the API directly
//!
//! Extraction never fails. Anything undecodable degrades to "claim not
//! determinable" and the policy layer decides what that means.

pub mod principal;
pub mod token;

use axum::http::HeaderMap;

use crate::middleware::RequestId;

/// Header carrying the base64-encoded signed-in principal
pub const PRINCIPAL_HEADER: &str = "x-ms-client-principal";
/// Header carrying the raw ID token
pub const ID_TOKEN_HEADER: &str = "x-ms-token-aad-id-token";
/// Header carrying the raw access token
pub const ACCESS_TOKEN_HEADER: &str = "x-ms-token-aad-access-token";

/// Host markers preceding the tenant segment in an issuer URL
///
/// `https://login.microsoftonline.com/<tenant>/v2.0` and
/// `https://sts.windows.net/<tenant>/` both place the tenant right after the host.
pub const ISSUER_HOST_MARKERS: [&str; 2] = ["login.microsoftonline.com/", "sts.windows.net/"];

/// Identity claims resolved for one request
///
/// `None` means the claim could not be determined from any source; a
/// resolved claim is never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Tenant identifier as supplied (compare case-insensitively)
    pub tenant_id: Option<String>,
    /// User identifier, lowercased
    pub user: Option<String>,
    /// Identity provider label, e.g. `aad`
    pub identity_provider: Option<String>,
}

impl IdentityClaims {
    /// True when both tenant and user are known
    pub fn is_complete(&self) -> bool {
        self.tenant_id.is_some() && self.user.is_some()
    }

    /// Fill gaps from `other`, keeping values already present
    pub fn merge_missing(&mut self, other: IdentityClaims) {
        if self.tenant_id.is_none() {
            self.tenant_id = other.tenant_id;
        }
        if self.user.is_none() {
            self.user = other.user;
        }
        if self.identity_provider.is_none() {
            self.identity_provider = other.identity_provider;
        }
    }

    /// Apply canonical casing: user identifiers compare lowercased
    fn normalized(mut self) -> Self {
        self.user = self.user.map(|u| u.trim().to_lowercase());
        self.tenant_id = self.tenant_id.map(|t| t.trim().to_string());
        self.identity_provider = self.identity_provider.map(|p| p.trim().to_string());
        self
    }
}

/// Resolve identity claims from request headers
///
/// Principal blob first; a token only fills what the principal left missing.
pub fn extract_claims(headers: &HeaderMap) -> IdentityClaims {
    extract_claims_traced(headers, None)
}

/// Same as [`extract_claims`], tagging debug logs with the request id
pub fn extract_claims_traced(headers: &HeaderMap, request_id: Option<RequestId>) -> IdentityClaims {
    let request_id = request_id.map(|id| id.to_string()).unwrap_or_default();

    let mut claims = header_str(headers, PRINCIPAL_HEADER)
        .map(principal::claims_from_principal)
        .unwrap_or_default();

    if !claims.is_complete() {
        if let Some(raw) = bearer_token(headers) {
            let from_token = token::claims_from_token(raw);
            tracing::debug!(
                request_id = %request_id,
                token_tenant = from_token.tenant_id.is_some(),
                token_user = from_token.user.is_some(),
                "Filling identity gaps from token"
            );
            claims.merge_missing(from_token);
        }
    }

    let claims = claims.normalized();
    tracing::debug!(
        request_id = %request_id,
        tenant_resolved = claims.tenant_id.is_some(),
        user_resolved = claims.user.is_some(),
        identity_provider = ?claims.identity_provider,
        "Identity claims resolved"
    );
    claims
}

/// Extract the tenant segment following a known host marker in an issuer URL
pub fn tenant_from_issuer(issuer: &str) -> Option<String> {
    let lower = issuer.to_ascii_lowercase();
    ISSUER_HOST_MARKERS.iter().find_map(|marker| {
        let start = lower.find(marker)? + marker.len();
        // Markers are ASCII, so byte offsets in `lower` are valid in `issuer`
        issuer[start..]
            .split('/')
            .next()
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Find a JWT among the token-bearing headers, ID token first
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, ID_TOKEN_HEADER)
        .or_else(|| header_str(headers, ACCESS_TOKEN_HEADER))
        .or_else(|| {
            header_str(headers, axum::http::header::AUTHORIZATION.as_str()).and_then(|value| {
                let (scheme, token) = value.split_once(' ')?;
                scheme
                    .eq_ignore_ascii_case("bearer")
                    .then(|| token.trim())
                    .filter(|t| !t.is_empty())
            })
        })
}
