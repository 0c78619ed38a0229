//! REST client for the generative language API.
//!
//! Text generation goes through `models/{model}:generateContent`; video
//! generation through Veo's `:predictLongRunning` endpoint, which returns an
//! operation name that is polled via the operations resource.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use storyreel_models::{VideoOperation, VideoOperationStatus};

use crate::error::{GenAiError, GenAiResult};

/// Model used for story expansion and scene segmentation.
pub const TEXT_MODEL: &str = "gemini-1.5-flash-latest";

/// Model used for video generation.
pub const VIDEO_MODEL: &str = "veo-3.1-generate-preview";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// GenAI client configuration.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// API key for the generative language API
    pub api_key: String,
    /// Base URL, overridable for tests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl GenAiConfig {
    /// Create a config with the production base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Create config from the `GEMINI_API_KEY` environment variable.
    ///
    /// Returns `Ok(None)` when the key is absent so callers can degrade the
    /// generation endpoints instead of refusing to start.
    pub fn from_env() -> GenAiResult<Option<Self>> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Some(Self::new(key))),
            _ => Ok(None),
        }
    }

    /// Override the base URL (used by tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

// Request/response DTOs for generateContent.

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Client for the generative language API.
#[derive(Clone)]
pub struct GenAiClient {
    http: Client,
    config: GenAiConfig,
}

impl GenAiClient {
    /// Create a new GenAI client.
    pub fn new(config: GenAiConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storyreel-genai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config })
    }

    /// Generate text for a prompt, returning the first candidate verbatim.
    pub async fn generate_content(&self, model: &str, prompt: &str) -> GenAiResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model, "Calling generateContent");
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| GenAiError::invalid_response("no content in response"))?;

        Ok(text)
    }

    /// Start an asynchronous video render, returning the operation handle.
    pub async fn generate_videos(&self, prompt: &str) -> GenAiResult<VideoOperation> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning?key={}",
            self.config.base_url, VIDEO_MODEL, self.config.api_key
        );

        let body = json!({ "instances": [{ "prompt": prompt }] });

        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = response.json().await?;
        let name = parsed
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GenAiError::invalid_response("operation has no name"))?
            .to_string();

        info!(operation = %name, "Started video generation");
        Ok(VideoOperation { name })
    }

    /// Look up the status of a video operation.
    pub async fn get_videos_operation(
        &self,
        operation_name: &str,
    ) -> GenAiResult<VideoOperationStatus> {
        let url = format!(
            "{}/v1beta/{}?key={}",
            self.config.base_url,
            operation_name.trim_start_matches('/'),
            self.config.api_key
        );

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = response.json().await?;
        let done = parsed.get("done").and_then(Value::as_bool).unwrap_or(false);

        if !done {
            return Ok(VideoOperationStatus::pending());
        }

        Ok(VideoOperationStatus::completed(extract_video_uri(&parsed)))
    }
}

/// Dig the asset URI out of a completed operation.
///
/// The operations resource has shipped two shapes for Veo results; accept
/// either, and treat a done operation with neither as success without an
/// asset.
fn extract_video_uri(operation: &Value) -> Option<String> {
    let response = operation.get("response")?;

    let from_samples = response
        .pointer("/generateVideoResponse/generatedSamples/0/video/uri")
        .and_then(Value::as_str);
    let from_videos = response
        .pointer("/generatedVideos/0/video/uri")
        .and_then(Value::as_str);

    from_samples.or(from_videos).map(str::to_string)
}
