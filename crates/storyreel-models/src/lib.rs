//! Shared data models for the StoryReel backend.
//!
//! This crate provides:
//! - Generation record and its status/step machine
//! - Scene records embedded in generation metadata
//! - Video operation types for the Veo polling flow

pub mod generation;
pub mod scene;
pub mod video;

pub use generation::{merge_metadata, meta_keys, Generation, GenerationStatus, GenerationStep};
pub use scene::Scene;
pub use video::{VideoOperation, VideoOperationStatus};
