//! GoTrue auth surface.
//!
//! Three operations back the passwordless flow: resolving a bearer token to a
//! user, sending a magic link, and exchanging an authorization code for a
//! session. Token validation itself is delegated to GoTrue; this module never
//! inspects the JWT locally.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::SupabaseClient;
use crate::error::{SupabaseError, SupabaseResult};

/// User identity resolved from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// GoTrue user id
    pub id: String,
    /// Email address, if the identity carries one
    #[serde(default)]
    pub email: Option<String>,
}

/// Session returned by the code exchange endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl SupabaseClient {
    /// Resolve a bearer access token to the user it belongs to.
    ///
    /// Invalid or expired tokens map to [`SupabaseError::Unauthorized`].
    pub async fn get_user(&self, access_token: &str) -> SupabaseResult<AuthUser> {
        let response = self
            .http()
            .get(self.auth_url("user"))
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let user: AuthUser = response.json().await?;
        debug!(user_id = %user.id, "Resolved bearer token");
        Ok(user)
    }

    /// Send a one-time login link to `email`, redirecting back to `redirect_to`.
    pub async fn send_magic_link(&self, email: &str, redirect_to: &str) -> SupabaseResult<()> {
        let response = self
            .http()
            .post(self.auth_url("otp"))
            .header("apikey", self.anon_key())
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "create_user": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Exchange an authorization code for a session (PKCE flow).
    pub async fn exchange_code(&self, code: &str) -> SupabaseResult<Session> {
        let response = self
            .http()
            .post(self.auth_url("token"))
            .header("apikey", self.anon_key())
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": code }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
