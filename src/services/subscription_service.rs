use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Subscription;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Manager(#[from] DatabaseError),
    #[error("Subscription not found: {0}")]
    NotFound(String),
}

pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub async fn new() -> Result<Self, SubscriptionError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Record a checkout. Keyed by the provider's subscription id so a
    /// retried checkout call stays idempotent.
    pub async fn create(
        &self,
        user_id: Uuid,
        razorpay_subscription_id: &str,
        plan_id: &str,
        status: &str,
    ) -> Result<Subscription, SubscriptionError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (user_id, razorpay_subscription_id, plan_id, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (razorpay_subscription_id) DO UPDATE SET
                 plan_id = EXCLUDED.plan_id,
                 status = EXCLUDED.status,
                 updated_at = now()
             RETURNING *",
        )
        .bind(user_id)
        .bind(razorpay_subscription_id)
        .bind(plan_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Apply a provider-side state change (webhook-driven).
    pub async fn update_from_provider(
        &self,
        razorpay_subscription_id: &str,
        status: &str,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<Subscription, SubscriptionError> {
        sqlx::query_as::<_, Subscription>(
            "UPDATE subscriptions
             SET status = $2,
                 current_period_end = COALESCE($3, current_period_end),
                 updated_at = now()
             WHERE razorpay_subscription_id = $1
             RETURNING *",
        )
        .bind(razorpay_subscription_id)
        .bind(status)
        .bind(current_period_end)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| SubscriptionError::NotFound(razorpay_subscription_id.to_string()))
    }

    pub async fn active_count(&self) -> Result<i64, SubscriptionError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
