use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Manager(#[from] DatabaseError),
    #[error("User not found: {0}")]
    NotFound(Uuid),
    #[error("Generation quota exhausted")]
    QuotaExhausted,
}

/// Outcome of a quota claim. Free-tier claims are metered (and must be
/// released if the provider call fails); paid plans pass through unmetered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaClaim {
    Metered,
    Unmetered,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, UserError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Upsert keyed by email. First sign-in creates the row with the
    /// free-tier defaults; later sign-ins refresh profile fields when the
    /// auth provider supplies them.
    pub async fn find_or_create_by_email(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        profile_image_url: Option<&str>,
    ) -> Result<User, UserError> {
        let free_limit = crate::config::config().quota.free_generation_limit;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, first_name, last_name, profile_image_url, generations_limit)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO UPDATE SET
                 first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                 last_name = COALESCE(EXCLUDED.last_name, users.last_name),
                 profile_image_url = COALESCE(EXCLUDED.profile_image_url, users.profile_image_url),
                 updated_at = now()
             RETURNING *",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(profile_image_url)
        .bind(free_limit)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Claim one generation against the free-tier quota. The check and the
    /// increment are a single statement, so concurrent requests cannot race
    /// past the limit.
    pub async fn claim_generation(&self, user: &User) -> Result<QuotaClaim, UserError> {
        if !user.is_free_tier() {
            return Ok(QuotaClaim::Unmetered);
        }

        let claimed: Option<(i32,)> = sqlx::query_as(
            "UPDATE users
             SET generations_used = generations_used + 1, updated_at = now()
             WHERE id = $1 AND generations_used < generations_limit
             RETURNING generations_used",
        )
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?;

        match claimed {
            Some(_) => Ok(QuotaClaim::Metered),
            None => Err(UserError::QuotaExhausted),
        }
    }

    /// Return a metered claim after a failed provider call, so failures do
    /// not consume quota.
    pub async fn release_generation(&self, user_id: Uuid) -> Result<(), UserError> {
        sqlx::query(
            "UPDATE users
             SET generations_used = GREATEST(generations_used - 1, 0), updated_at = now()
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip the plan and its generation allowance (webhook-driven).
    pub async fn set_plan(
        &self,
        user_id: Uuid,
        subscription_type: &str,
        generations_limit: i32,
    ) -> Result<User, UserError> {
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET subscription_type = $2, generations_limit = $3, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(subscription_type)
        .bind(generations_limit)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserError::NotFound(user_id))
    }

    pub async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, UserError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
