//! GenAI error types.

use thiserror::Error;

/// Result type for GenAI operations.
pub type GenAiResult<T> = Result<T, GenAiError>;

/// Errors that can occur talking to the generative language API.
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenAiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient errors are worth retrying during a poll loop; anything else
    /// ends the loop immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            GenAiError::Network(_) => true,
            GenAiError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GenAiError::Api { status: 503, body: String::new() }.is_transient());
        assert!(GenAiError::Api { status: 429, body: String::new() }.is_transient());
        assert!(!GenAiError::Api { status: 400, body: String::new() }.is_transient());
        assert!(!GenAiError::invalid_response("no candidates").is_transient());
    }
}
