//! The generation orchestration flow.
//!
//! One run sequences: create record (processing/initializing) -> story
//! expansion -> scene segmentation -> terminal completed, with a failure
//! transition absorbing any step error. Each successful step performs
//! exactly one metadata merge before advancing; the failure transition
//! merges `{step: failed, error}` so story and scenes already computed stay
//! on the record. A run is never resumed: retries create a new record.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use storyreel_genai::prompts::{build_scenes_prompt, build_story_prompt};
use storyreel_genai::{parse_scenes_lenient, GenAiClient, TEXT_MODEL};
use storyreel_models::{meta_keys, GenerationStep, Scene};
use storyreel_supabase::GenerationRepository;

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Result of a completed orchestration run.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub generation_id: String,
    pub story: String,
    pub scenes: Vec<Scene>,
    /// Set when segmentation fell back to an empty scene list, so callers
    /// can tell "no scenes by design" from "parsing failed".
    pub scene_error: Option<String>,
}

/// Sequences the story and scene steps against one generation record.
pub struct GenerationOrchestrator {
    genai: Arc<GenAiClient>,
    generations: GenerationRepository,
}

impl GenerationOrchestrator {
    pub fn new(genai: Arc<GenAiClient>, generations: GenerationRepository) -> Self {
        Self { genai, generations }
    }

    /// Run the full flow for one prompt.
    ///
    /// The record is created before any AI call; on step failure it is
    /// marked `failed` and the error is surfaced to the caller.
    pub async fn run(&self, prompt: &str) -> ApiResult<GenerationOutcome> {
        let generation = self.generations.create(prompt).await?;
        metrics::record_generation_started();

        match self.run_steps(&generation.id, prompt).await {
            Ok(outcome) => {
                metrics::record_generation_completed();
                Ok(outcome)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(db_err) = self.generations.fail(&generation.id, &message).await {
                    warn!(
                        generation_id = %generation.id,
                        error = %db_err,
                        "Failed to record generation failure"
                    );
                }
                metrics::record_generation_failed();
                Err(ApiError::upstream(format!("AI generation failed: {message}")))
            }
        }
    }

    async fn run_steps(&self, generation_id: &str, prompt: &str) -> ApiResult<GenerationOutcome> {
        // Story expansion: one call, no retry, output accepted verbatim.
        let story = self
            .genai
            .generate_content(TEXT_MODEL, &build_story_prompt(prompt))
            .await?;

        self.generations
            .update_metadata(
                generation_id,
                &json!({
                    meta_keys::STEP: GenerationStep::StoryGenerated,
                    meta_keys::STORY: story,
                }),
            )
            .await?;

        // Scene segmentation: malformed output degrades to an empty list
        // with a recorded reason rather than failing the run.
        let raw_scenes = self
            .genai
            .generate_content(TEXT_MODEL, &build_scenes_prompt(&story))
            .await?;
        let (scenes, parse_error) = parse_scenes_lenient(&raw_scenes);
        let scene_error = parse_error.map(|e| e.to_string());

        let mut patch = json!({
            meta_keys::STEP: GenerationStep::ScenesGenerated,
            meta_keys::SCENES: &scenes,
        });
        if let Some(ref reason) = scene_error {
            patch[meta_keys::SCENE_ERROR] = json!(reason);
        }
        self.generations
            .update_metadata(generation_id, &patch)
            .await?;

        self.generations
            .complete(
                generation_id,
                &json!({ meta_keys::STEP: GenerationStep::Completed }),
            )
            .await?;

        info!(
            generation_id,
            scenes = scenes.len(),
            "Generation flow completed"
        );

        Ok(GenerationOutcome {
            generation_id: generation_id.to_string(),
            story,
            scenes,
            scene_error,
        })
    }
}
