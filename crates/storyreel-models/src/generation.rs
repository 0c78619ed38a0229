//! Generation record and its status machine.
//!
//! A `Generation` is one persisted row in the `generations` table, tracking a
//! single prompt-to-story(-to-video) request across the orchestration steps.
//! The `metadata` column is a JSON step log; updates are always shallow merges
//! so earlier steps survive later transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recognized keys in the generation metadata step log.
pub mod meta_keys {
    pub const STEP: &str = "step";
    pub const STORY: &str = "story";
    pub const SCENES: &str = "scenes";
    pub const SCENE_ERROR: &str = "scene_error";
    pub const ERROR: &str = "error";
    pub const VIDEO_OPERATION: &str = "video_operation";
    pub const VIDEO_STATUS: &str = "video_status";
    pub const VIDEO_STARTED_AT: &str = "video_started_at";
}

/// Top-level lifecycle status of a generation record.
///
/// Monotonic: `Processing -> {Completed, Failed}`. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Orchestration is in flight
    #[default]
    Processing,
    /// Story (and possibly scenes) produced
    Completed,
    /// A step or the persistence collaborator raised
    Failed,
}

impl GenerationStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained step marker kept under the `step` metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    Initializing,
    StoryGenerated,
    ScenesGenerated,
    Completed,
    Failed,
}

impl GenerationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStep::Initializing => "initializing",
            GenerationStep::StoryGenerated => "story_generated",
            GenerationStep::ScenesGenerated => "scenes_generated",
            GenerationStep::Completed => "completed",
            GenerationStep::Failed => "failed",
        }
    }
}

impl std::fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted generation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Opaque id assigned by the store at insert
    pub id: String,
    /// Original user prompt, immutable after creation
    pub prompt: String,
    /// Top-level lifecycle status
    pub status: GenerationStatus,
    /// JSON step log; see [`meta_keys`]
    #[serde(default)]
    pub metadata: Value,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Set only on the terminal transition
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Generation {
    /// Check if the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Current step marker from the metadata log, if one is recorded.
    pub fn step(&self) -> Option<GenerationStep> {
        self.metadata
            .get(meta_keys::STEP)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Shallow-merge a metadata patch into this record's step log.
    pub fn merge_metadata(&mut self, patch: &Value) {
        merge_metadata(&mut self.metadata, patch);
    }
}

/// Shallow-merge `patch` into `base`, key by key.
///
/// Both values are expected to be JSON objects; a non-object `base` is
/// replaced wholesale. Keys present in `patch` overwrite, keys absent from
/// `patch` are preserved. Earlier step output (story, scenes) therefore
/// survives later transitions, including the failure transition.
pub fn merge_metadata(base: &mut Value, patch: &Value) {
    match (base.as_object_mut(), patch.as_object()) {
        (Some(base_map), Some(patch_map)) => {
            for (k, v) in patch_map {
                base_map.insert(k.clone(), v.clone());
            }
        }
        _ => *base = patch.clone(),
    }
}
