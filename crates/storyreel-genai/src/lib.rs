//! Google GenAI client for the StoryReel flow.
//!
//! This crate provides:
//! - Gemini text generation (story expansion, scene segmentation)
//! - Veo video generation and operation-status lookup
//! - Tolerant scene-array extraction from model output
//! - The bounded fixed-interval video poll loop

pub mod client;
pub mod error;
pub mod poll;
pub mod prompts;
pub mod scenes;

pub use client::{GenAiClient, GenAiConfig, TEXT_MODEL, VIDEO_MODEL};
pub use error::{GenAiError, GenAiResult};
pub use poll::{PollConfig, PollOutcome, VideoPoller, VideoStatusSource};
pub use scenes::{parse_scenes, parse_scenes_lenient, SceneParseError};
