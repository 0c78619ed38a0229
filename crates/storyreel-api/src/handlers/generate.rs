//! Story generation handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use storyreel_models::Scene;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::GenerationOrchestrator;
use crate::state::AppState;

/// Generate request body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Generate response body.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generation_id: String,
    pub story: String,
    pub scenes: Vec<Scene>,
    /// Present when scene segmentation fell back to an empty list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_error: Option<String>,
}

/// Run the prompt-to-story-to-scenes flow.
pub async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }

    let genai = state.genai()?.clone();
    let orchestrator = GenerationOrchestrator::new(genai, state.generations.clone());

    let outcome = orchestrator.run(&request.prompt).await?;

    Ok(Json(GenerateResponse {
        generation_id: outcome.generation_id,
        story: outcome.story,
        scenes: outcome.scenes,
        scene_error: outcome.scene_error,
    }))
}
