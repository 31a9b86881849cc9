use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::generation::status;
use crate::database::models::Generation;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Manager(#[from] DatabaseError),
    #[error("Generation not found: {0}")]
    NotFound(Uuid),
}

pub struct GenerationService {
    pool: PgPool,
}

impl GenerationService {
    pub async fn new() -> Result<Self, GenerationError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Insert the pending record before the provider is called, so every
    /// request leaves a row even when the provider never answers.
    pub async fn create_pending(
        &self,
        user_id: Uuid,
        generation_type: &str,
        model: &str,
        prompt: Option<&str>,
        metadata: &Value,
    ) -> Result<Generation, GenerationError> {
        let generation = sqlx::query_as::<_, Generation>(
            "INSERT INTO generations (user_id, \"type\", model, prompt, metadata, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(user_id)
        .bind(generation_type)
        .bind(model)
        .bind(prompt)
        .bind(metadata)
        .bind(status::PENDING)
        .fetch_one(&self.pool)
        .await?;

        Ok(generation)
    }

    pub async fn complete(&self, id: Uuid, result: &Value) -> Result<Generation, GenerationError> {
        self.finish(id, status::COMPLETED, result).await
    }

    pub async fn fail(&self, id: Uuid, message: &str) -> Result<Generation, GenerationError> {
        self.finish(id, status::FAILED, &json!({ "error": message }))
            .await
    }

    async fn finish(
        &self,
        id: Uuid,
        terminal_status: &str,
        result: &Value,
    ) -> Result<Generation, GenerationError> {
        sqlx::query_as::<_, Generation>(
            "UPDATE generations
             SET status = $2, result = $3, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(terminal_status)
        .bind(result)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GenerationError::NotFound(id))
    }

    /// Shallow-merge extra keys into the metadata column (e.g. cached image
    /// filenames recorded after the provider answered).
    pub async fn merge_metadata(&self, id: Uuid, patch: &Value) -> Result<(), GenerationError> {
        let updated = sqlx::query(
            "UPDATE generations
             SET metadata = metadata || $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(GenerationError::NotFound(id));
        }
        Ok(())
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Generation>, GenerationError> {
        let generations = sqlx::query_as::<_, Generation>(
            "SELECT * FROM generations
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(generations)
    }

    pub async fn count(&self) -> Result<i64, GenerationError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM generations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn count_by_status(&self, status: &str) -> Result<i64, GenerationError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM generations WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn counts_by_type(&self) -> Result<Vec<(String, i64)>, GenerationError> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT \"type\", COUNT(*) FROM generations GROUP BY \"type\" ORDER BY \"type\"",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
