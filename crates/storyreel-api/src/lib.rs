//! Axum HTTP API server for the StoryReel generation flow.
//!
//! This crate provides:
//! - The prompt-to-story-to-scenes orchestration surface
//! - Veo video submission and status checks
//! - Magic-link auth endpoints backed by the Supabase collaborator
//! - Rate limiting, security headers, and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AccessPolicy, AuthUser};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::GenerationOrchestrator;
pub use state::AppState;
