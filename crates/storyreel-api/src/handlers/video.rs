//! Video generation handlers: submission and single status checks.
//!
//! The interval-driven poll loop itself lives in `storyreel_genai::poll`
//! and is driven by the consuming client; `check_video` is one poll call.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use storyreel_models::{meta_keys, Scene};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Video generation request body.
#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    /// Composite prompt; when absent it is derived from the first stored
    /// scene of `generation_id`
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "generationId")]
    pub generation_id: Option<String>,
}

/// Video generation response body.
#[derive(Serialize)]
pub struct GenerateVideoResponse {
    pub operation: String,
    pub message: String,
}

/// Submit the first scene for video generation.
pub async fn generate_video(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<Json<GenerateVideoResponse>> {
    let genai = state.genai()?.clone();

    let prompt = match request.prompt.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => match request.generation_id.as_deref() {
            Some(id) => first_scene_prompt(&state, id).await?,
            None => return Err(ApiError::bad_request("Prompt is required")),
        },
    };

    info!("Starting video generation");
    let operation = genai.generate_videos(&prompt).await.map_err(|e| {
        ApiError::upstream(format!("Video generation failed: {e}"))
    })?;
    metrics::record_video_started();

    if let Some(ref id) = request.generation_id {
        let patch = json!({
            meta_keys::VIDEO_OPERATION: operation.name,
            meta_keys::VIDEO_STATUS: "generating",
            meta_keys::VIDEO_STARTED_AT: Utc::now(),
        });
        if let Err(e) = state.generations.update_metadata(id, &patch).await {
            // The render is already running; a bookkeeping failure should
            // not hide the operation handle from the caller.
            warn!(generation_id = %id, error = %e, "Failed to record video operation");
        }
    }

    Ok(Json(GenerateVideoResponse {
        operation: operation.name,
        message: "Video generation started. Use the operation ID to check status.".to_string(),
    }))
}

/// Derive the composite prompt from the record's first scene.
async fn first_scene_prompt(state: &AppState, generation_id: &str) -> ApiResult<String> {
    let generation = state
        .generations
        .get(generation_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("no scenes available"))?;

    let scenes: Vec<Scene> = generation
        .metadata
        .get(meta_keys::SCENES)
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ApiError::internal(format!("stored scenes are malformed: {e}")))?
        .unwrap_or_default();

    scenes
        .first()
        .map(Scene::video_prompt)
        .ok_or_else(|| ApiError::bad_request("no scenes available"))
}

/// Status check request body.
#[derive(Debug, Deserialize)]
pub struct CheckVideoRequest {
    #[serde(rename = "operationName")]
    pub operation_name: String,
}

/// Status check response body.
#[derive(Serialize)]
pub struct CheckVideoResponse {
    pub done: bool,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    pub message: String,
}

/// One poll of the video operation status.
pub async fn check_video(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<CheckVideoRequest>,
) -> ApiResult<Json<CheckVideoResponse>> {
    if request.operation_name.trim().is_empty() {
        return Err(ApiError::bad_request("Operation name is required"));
    }

    let genai = state.genai()?;
    let status = genai
        .get_videos_operation(&request.operation_name)
        .await
        .map_err(|e| ApiError::upstream(format!("Failed to check video status: {e}")))?;

    let message = if status.done {
        "Video generation complete!"
    } else {
        "Video is still generating..."
    };

    Ok(Json(CheckVideoResponse {
        done: status.done,
        video_url: status.video_url,
        message: message.to_string(),
    }))
}
