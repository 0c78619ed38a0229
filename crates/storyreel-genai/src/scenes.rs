//! Tolerant scene-array extraction from model output.
//!
//! The segmentation instruction asks for a bare JSON array, but models wrap
//! output in markdown fences or surrounding prose often enough that the
//! extractor takes the first-`[`-to-last-`]` substring and parses that. A
//! missing or unparsable array never raises into the flow: callers get an
//! empty scene list plus a structured reason they can persist.

use thiserror::Error;
use tracing::warn;

use storyreel_models::Scene;

/// Why a model response yielded no scenes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneParseError {
    #[error("no JSON array found in model response")]
    NoArrayFound,

    #[error("scene array failed to parse: {0}")]
    InvalidJson(String),
}

/// Extract the first-`[`-to-last-`]` substring, if any.
fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the scene array out of a raw model response.
pub fn parse_scenes(text: &str) -> Result<Vec<Scene>, SceneParseError> {
    let array = extract_array(text).ok_or(SceneParseError::NoArrayFound)?;
    serde_json::from_str(array).map_err(|e| SceneParseError::InvalidJson(e.to_string()))
}

/// Parse scenes with the empty-list fallback.
///
/// Returns the scenes plus the parse failure, if any, so the orchestrator can
/// complete the run while still recording that segmentation went wrong.
pub fn parse_scenes_lenient(text: &str) -> (Vec<Scene>, Option<SceneParseError>) {
    match parse_scenes(text) {
        Ok(scenes) => (scenes, None),
        Err(e) => {
            warn!(error = %e, "Falling back to empty scene list");
            (Vec::new(), Some(e))
        }
    }
}
