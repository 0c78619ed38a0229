//! Supabase error types.

use thiserror::Error;

/// Result type for Supabase operations.
pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Errors that can occur talking to the Supabase REST surface.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            SupabaseError::Network(_) => true,
            SupabaseError::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
