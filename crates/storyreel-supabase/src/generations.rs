//! Typed repository for the `generations` table.
//!
//! PostgREST column updates replace whole values, so metadata writes go
//! through a read-merge-write cycle here: the repository fetches the current
//! step log, shallow-merges the patch, and writes the merged object back.
//! Steps within one run are strictly sequential, so the cycle is not racy.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use storyreel_models::{merge_metadata, meta_keys, Generation, GenerationStatus, GenerationStep};

use crate::client::SupabaseClient;
use crate::error::{SupabaseError, SupabaseResult};

const TABLE: &str = "generations";

/// Repository for generation records.
#[derive(Clone)]
pub struct GenerationRepository {
    client: SupabaseClient,
}

impl GenerationRepository {
    /// Create a new generation repository.
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Insert a new record with `status=processing` and an `initializing`
    /// step log, returning the stored row (id and timestamps come from the
    /// store's defaults).
    pub async fn create(&self, prompt: &str) -> SupabaseResult<Generation> {
        let body = json!({
            "prompt": prompt,
            "status": GenerationStatus::Processing,
            "metadata": { meta_keys::STEP: GenerationStep::Initializing },
        });

        let response = self
            .client
            .http()
            .post(self.client.rest_url(TABLE))
            .header("apikey", self.client.anon_key())
            .bearer_auth(self.client.anon_key())
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let mut rows: Vec<Generation> = response.json().await?;
        let generation = rows
            .pop()
            .ok_or_else(|| SupabaseError::invalid_response("insert returned no row"))?;

        info!(generation_id = %generation.id, "Created generation record");
        Ok(generation)
    }

    /// Get a record by id.
    pub async fn get(&self, id: &str) -> SupabaseResult<Option<Generation>> {
        let response = self
            .client
            .http()
            .get(self.client.rest_url(TABLE))
            .header("apikey", self.client.anon_key())
            .bearer_auth(self.client.anon_key())
            .query(&[("id", format!("eq.{id}").as_str()), ("select", "*")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let mut rows: Vec<Generation> = response.json().await?;
        Ok(rows.pop())
    }

    /// Merge a metadata patch into the record's step log.
    pub async fn update_metadata(&self, id: &str, patch: &Value) -> SupabaseResult<()> {
        let metadata = self.merged_metadata(id, patch).await?;
        self.patch_row(id, json!({ "metadata": metadata })).await
    }

    /// Terminal success: merge the final metadata patch and set
    /// `status=completed` plus `completed_at`.
    pub async fn complete(&self, id: &str, patch: &Value) -> SupabaseResult<()> {
        let metadata = self.merged_metadata(id, patch).await?;
        self.patch_row(
            id,
            json!({
                "status": GenerationStatus::Completed,
                "completed_at": Utc::now(),
                "metadata": metadata,
            }),
        )
        .await?;
        info!(generation_id = %id, "Generation completed");
        Ok(())
    }

    /// Terminal failure: merge `{step: failed, error}` into the step log and
    /// set `status=failed`. Story and scenes recorded by earlier steps stay
    /// in the log.
    pub async fn fail(&self, id: &str, error: &str) -> SupabaseResult<()> {
        let patch = json!({
            meta_keys::STEP: GenerationStep::Failed,
            meta_keys::ERROR: error,
        });
        let metadata = self.merged_metadata(id, &patch).await?;
        self.patch_row(
            id,
            json!({
                "status": GenerationStatus::Failed,
                "metadata": metadata,
            }),
        )
        .await?;
        info!(generation_id = %id, "Generation failed");
        Ok(())
    }

    /// Fetch the current step log and shallow-merge `patch` into it.
    async fn merged_metadata(&self, id: &str, patch: &Value) -> SupabaseResult<Value> {
        let generation = self
            .get(id)
            .await?
            .ok_or_else(|| SupabaseError::not_found(format!("generation {id}")))?;

        let mut metadata = generation.metadata;
        merge_metadata(&mut metadata, patch);
        Ok(metadata)
    }

    async fn patch_row(&self, id: &str, body: Value) -> SupabaseResult<()> {
        let response = self
            .client
            .http()
            .patch(self.client.rest_url(TABLE))
            .header("apikey", self.client.anon_key())
            .bearer_auth(self.client.anon_key())
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{id}").as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
