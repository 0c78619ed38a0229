//! Instruction templates for the generation steps.

/// Instruction for expanding a user prompt into a short story.
pub fn build_story_prompt(prompt: &str) -> String {
    format!(
        r#"You are a creative storyteller. Transform this short idea into a compelling 200-300 word story with vivid visual details:

"{prompt}"

Make it cinematic, emotional, and rich with imagery. Focus on visual scenes that could be turned into images."#
    )
}

/// Instruction for segmenting a story into 4-6 visual scenes as a JSON array.
pub fn build_scenes_prompt(story: &str) -> String {
    format!(
        r#"Break this story into 4-6 visual scenes. For each scene, provide a detailed image generation prompt.

Story: {story}

Format your response as a JSON array of objects with this structure:
[
  {{
    "scene_number": 1,
    "description": "brief scene description",
    "image_prompt": "detailed prompt for image generation"
  }}
]

Only return the JSON array, nothing else."#
    )
}
