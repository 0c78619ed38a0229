//! Scene records embedded in generation metadata.

use serde::{Deserialize, Serialize};

/// One visual scene segmented out of a generated story.
///
/// Scenes are transient: they live inside the generation record's metadata
/// rather than in their own table. The segmentation instruction asks for 4-6
/// of them, but consumers must tolerate any count, including zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based position within the story; ordering-significant
    pub scene_number: u32,
    /// Short human-readable summary
    pub description: String,
    /// Detailed prompt intended for an image/video generator
    pub image_prompt: String,
}

impl Scene {
    /// Composite prompt used when submitting this scene for video generation.
    pub fn video_prompt(&self) -> String {
        format!("{}. {}", self.description, self.image_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_serde_shape() {
        let json = r#"{"scene_number": 1, "description": "a beam sweeps the fog", "image_prompt": "wide shot, rain-lashed lighthouse at dusk"}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.scene_number, 1);

        let back = serde_json::to_value(&scene).unwrap();
        assert_eq!(back["image_prompt"], "wide shot, rain-lashed lighthouse at dusk");
    }

    #[test]
    fn test_video_prompt_concatenation() {
        let scene = Scene {
            scene_number: 1,
            description: "a beam sweeps the fog".into(),
            image_prompt: "wide shot at dusk".into(),
        };
        assert_eq!(scene.video_prompt(), "a beam sweeps the fog. wide shot at dusk");
    }
}
