//! Passwordless auth handlers: magic-link login and the code-exchange
//! callback.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Login response body.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
}

/// Send a magic link to the allowed address.
///
/// The policy check runs before any collaborator call, so unknown addresses
/// never trigger an email.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if !state.policy.allows(&request.email) {
        return Err(ApiError::forbidden(format!(
            "Access restricted. Only {} is allowed to use this app.",
            state.policy.allowed_email()
        )));
    }

    state
        .supabase
        .send_magic_link(&request.email, &state.config.site_url)
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!("Magic link sent");
    Ok(Json(LoginResponse {
        message: "Check your email for the login link!".to_string(),
    }))
}

/// Auth callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Complete the magic-link flow: exchange the authorization code for a
/// session, then redirect back to the site origin. Failures redirect with an
/// `error` query parameter instead of rendering a response.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    if let Some(error) = params.error {
        let detail = params.error_description.unwrap_or(error);
        warn!(error = %detail, "Auth callback returned an error");
        return redirect_with_error(&state.config.site_url, &detail);
    }

    let Some(code) = params.code else {
        return Redirect::to(&state.config.site_url);
    };

    match state.supabase.exchange_code(&code).await {
        Ok(_) => Redirect::to(&state.config.site_url),
        Err(e) => {
            warn!(error = %e, "Code exchange failed");
            redirect_with_error(&state.config.site_url, "auth_failed")
        }
    }
}

fn redirect_with_error(site_url: &str, message: &str) -> Redirect {
    match Url::parse(site_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("error", message);
            Redirect::to(url.as_str())
        }
        Err(_) => Redirect::to(site_url),
    }
}
