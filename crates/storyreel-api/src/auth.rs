//! The identity gate.
//!
//! Every protected handler resolves the bearer token and applies the access
//! policy through this one extractor; there is no session cache, so revoked
//! credentials are rejected at the next call. The policy itself is a small
//! predicate over the resolved email so widening access is a configuration
//! change rather than a code change.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use storyreel_supabase::SupabaseError;

use crate::error::ApiError;
use crate::state::AppState;

/// Authorization policy over resolved identities.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed_email: String,
}

impl AccessPolicy {
    /// Policy allowing exactly one email address.
    pub fn single_user(allowed_email: impl Into<String>) -> Self {
        Self {
            allowed_email: allowed_email.into(),
        }
    }

    /// Case-sensitive check against the allowed address.
    pub fn allows(&self, email: &str) -> bool {
        !self.allowed_email.is_empty() && email == self.allowed_email
    }

    /// The configured address, for error messages.
    pub fn allowed_email(&self) -> &str {
        &self.allowed_email
    }

    /// The 403 every gate rejection produces.
    pub fn deny(&self) -> ApiError {
        ApiError::forbidden(format!(
            "Access denied. Only {} can use this service.",
            self.allowed_email
        ))
    }
}

/// Authenticated identity that passed the access policy.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let token = header
            .strip_prefix("Bearer ")
            .unwrap_or(header)
            .trim();
        if token.is_empty() {
            return Err(ApiError::unauthorized("Authentication required"));
        }

        let user = state.supabase.get_user(token).await.map_err(|e| match e {
            SupabaseError::Unauthorized(_) => ApiError::unauthorized("Invalid authentication"),
            other => ApiError::Supabase(other),
        })?;

        let email = user
            .email
            .ok_or_else(|| ApiError::unauthorized("Invalid authentication"))?;

        if !state.policy.allows(&email) {
            return Err(state.policy.deny());
        }

        Ok(AuthUser { id: user.id, email })
    }
}
