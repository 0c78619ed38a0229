//! Application state.

use std::sync::Arc;

use tracing::warn;

use storyreel_genai::{GenAiClient, GenAiConfig};
use storyreel_supabase::{GenerationRepository, SupabaseClient};

use crate::auth::AccessPolicy;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub supabase: Arc<SupabaseClient>,
    pub generations: GenerationRepository,
    /// Absent when GEMINI_API_KEY is not configured; the generation
    /// endpoints then answer with a fixed error instead of the server
    /// refusing to start.
    pub genai: Option<Arc<GenAiClient>>,
    pub policy: AccessPolicy,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let supabase = Arc::new(SupabaseClient::from_env()?);
        let generations = GenerationRepository::new((*supabase).clone());

        let genai = match GenAiConfig::from_env()? {
            Some(genai_config) => Some(Arc::new(GenAiClient::new(genai_config)?)),
            None => {
                warn!("GEMINI_API_KEY not configured; generation endpoints disabled");
                None
            }
        };

        let policy = AccessPolicy::single_user(&config.allowed_email);

        Ok(Self {
            config,
            supabase,
            generations,
            genai,
            policy,
        })
    }

    /// The GenAI client, or the fixed degraded-capability error.
    pub fn genai(&self) -> Result<&Arc<GenAiClient>, crate::error::ApiError> {
        self.genai.as_ref().ok_or_else(|| {
            crate::error::ApiError::service_unavailable(
                "Gemini API key not configured. Please set GEMINI_API_KEY environment variable.",
            )
        })
    }
}
