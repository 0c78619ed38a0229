//! Supabase REST API client.
//!
//! One HTTP client shared by the GoTrue auth surface and the PostgREST
//! repositories, with connection pooling and timeouts tuned once.

use std::time::Duration;

use reqwest::Client;

use crate::error::{SupabaseError, SupabaseResult};

/// Supabase client configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Anon (publishable) API key
    pub anon_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl SupabaseConfig {
    /// Create a config with default timeouts.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| SupabaseError::config("SUPABASE_URL must be set"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| SupabaseError::config("SUPABASE_ANON_KEY must be set"))?;

        if base_url.is_empty() || anon_key.is_empty() {
            return Err(SupabaseError::config(
                "SUPABASE_URL and SUPABASE_ANON_KEY cannot be empty",
            ));
        }

        Ok(Self::new(base_url, anon_key))
    }
}

/// Supabase REST API client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    pub fn new(config: SupabaseConfig) -> SupabaseResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("storyreel-supabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SupabaseError::Network)?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    /// Anon key sent as the `apikey` header on every request.
    pub(crate) fn anon_key(&self) -> &str {
        &self.config.anon_key
    }

    /// URL for a GoTrue endpoint, e.g. `auth_url("user")`.
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url, path)
    }

    /// URL for a PostgREST table, e.g. `rest_url("generations")`.
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
}
