//! Access policy evaluation
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. An asserted identity provider must belong to the expected family.
//! 2. A configured user allow-list must contain the resolved user.
//! 3. A configured tenant must match the resolved tenant (case-insensitive).
//!    An unresolved tenant is tolerated only when the user allow-list already
//!    vouched for the caller.
//! 4. With no allow-lists configured the gateway is open.

use axum::http::StatusCode;
use std::collections::BTreeSet;

use crate::config::{ALLOWED_TENANT_ID_KEY, ALLOWED_USERS_KEY, Environment};
use crate::error::AppError;
use crate::identity::IdentityClaims;

pub const SIGN_IN_REQUIRED: &str = "Sign-in required. Please sign in with your organizational account.";
pub const USER_NOT_AUTHORIZED: &str = "Access denied. Your account is not authorized.";
pub const WRONG_TENANT: &str = "Access denied. Wrong tenant.";
pub const TENANT_UNVERIFIED: &str = "Access denied. Unable to verify tenant.";

/// Provider labels accepted as the organizational identity family
pub const DEFAULT_PROVIDER_MARKERS: [&str; 3] = ["aad", "azureactivedirectory", "entra"];

/// Which rule produced a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyRule {
    Provider,
    UserNotAllowed,
    TenantMismatch,
    TenantUnresolved,
}

impl DenyRule {
    /// Prometheus label for this rule
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyRule::Provider => "provider",
            DenyRule::UserNotAllowed => "user_not_allowed",
            DenyRule::TenantMismatch => "tenant_mismatch",
            DenyRule::TenantUnresolved => "tenant_unresolved",
        }
    }
}

/// Outcome of evaluating the policy for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub status: StatusCode,
    pub rule: Option<DenyRule>,
    pub expected_tenant: Option<String>,
    pub actual_tenant: Option<String>,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            status: StatusCode::OK,
            rule: None,
            expected_tenant: None,
            actual_tenant: None,
        }
    }

    fn deny(rule: DenyRule, reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
            status: StatusCode::FORBIDDEN,
            rule: Some(rule),
            expected_tenant: None,
            actual_tenant: None,
        }
    }

    /// Convert into a handler result: `Ok(())` when allowed
    pub fn into_result(self) -> Result<(), AppError> {
        if self.allowed {
            return Ok(());
        }
        Err(AppError::AccessDenied {
            reason: self.reason.unwrap_or_else(|| USER_NOT_AUTHORIZED.to_string()),
            expected_tenant: self.expected_tenant,
            actual_tenant: self.actual_tenant,
        })
    }
}

/// Tenant and user allow-lists
///
/// Built once at startup. An empty policy admits everyone.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed_tenant_id: Option<String>,
    allowed_users: BTreeSet<String>,
    provider_markers: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::open()
    }
}

impl AccessPolicy {
    /// Policy with no allow-lists (open gateway)
    pub fn open() -> Self {
        Self {
            allowed_tenant_id: None,
            allowed_users: BTreeSet::new(),
            provider_markers: DEFAULT_PROVIDER_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Restrict to a single tenant
    pub fn with_allowed_tenant(mut self, tenant: impl Into<String>) -> Self {
        let tenant = tenant.into().trim().to_string();
        self.allowed_tenant_id = (!tenant.is_empty()).then_some(tenant);
        self
    }

    /// Restrict to a set of users (compared lowercased)
    pub fn with_allowed_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_users = users
            .into_iter()
            .map(|u| u.as_ref().trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        self
    }

    /// Build from `ALLOWED_TENANT_ID` and `ALLOWED_USERS`
    pub fn from_env(env: &Environment) -> Self {
        let mut policy = Self::open();
        if let Some(tenant) = env.get(ALLOWED_TENANT_ID_KEY) {
            policy = policy.with_allowed_tenant(tenant);
        }
        if let Some(users) = env.get(ALLOWED_USERS_KEY) {
            policy = policy.with_allowed_users(users.split(','));
        }
        policy
    }

    pub fn allowed_tenant_id(&self) -> Option<&str> {
        self.allowed_tenant_id.as_deref()
    }

    pub fn allowed_users(&self) -> &BTreeSet<String> {
        &self.allowed_users
    }

    /// True when neither allow-list is configured
    pub fn is_open(&self) -> bool {
        self.allowed_tenant_id.is_none() && self.allowed_users.is_empty()
    }

    fn provider_matches(&self, provider: &str) -> bool {
        let provider = provider.to_ascii_lowercase();
        self.provider_markers.iter().any(|m| provider.contains(m.as_str()))
    }

    /// Decide whether the caller may use the gateway
    pub fn evaluate(&self, claims: &IdentityClaims) -> AccessDecision {
        if let Some(provider) = claims.identity_provider.as_deref() {
            if !self.provider_matches(provider) {
                return AccessDecision::deny(DenyRule::Provider, SIGN_IN_REQUIRED);
            }
        }

        let user_list_configured = !self.allowed_users.is_empty();
        if user_list_configured {
            let listed = claims
                .user
                .as_deref()
                .is_some_and(|u| self.allowed_users.contains(&u.to_lowercase()));
            if !listed {
                return AccessDecision::deny(DenyRule::UserNotAllowed, USER_NOT_AUTHORIZED);
            }
        }

        if let Some(expected) = self.allowed_tenant_id.as_deref() {
            match claims.tenant_id.as_deref() {
                Some(actual) if !actual.eq_ignore_ascii_case(expected) => {
                    let mut decision = AccessDecision::deny(DenyRule::TenantMismatch, WRONG_TENANT);
                    decision.expected_tenant = Some(expected.to_string());
                    decision.actual_tenant = Some(actual.to_string());
                    return decision;
                }
                None if !user_list_configured => {
                    return AccessDecision::deny(DenyRule::TenantUnresolved, TENANT_UNVERIFIED);
                }
                _ => {}
            }
        }

        AccessDecision::allow()
    }
}
