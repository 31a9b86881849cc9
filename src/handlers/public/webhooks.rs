use axum::{body::Bytes, http::HeaderMap};
use serde_json::{json, Value};

use crate::billing::razorpay::RazorpayEvent;
use crate::billing::RazorpayClient;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::subscription_service::SubscriptionError;
use crate::services::{SubscriptionService, UserService};

/// POST /api/webhooks/razorpay - Billing provider event sink
///
/// The raw body is verified against `X-Razorpay-Signature` before parsing.
/// Subscription state changes are mirrored into the subscriptions table and
/// flip the owner's plan.
pub async fn razorpay(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let signature = headers
        .get("x-razorpay-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing X-Razorpay-Signature header"))?;

    let client = RazorpayClient::from_config()?;
    let event = client.verify_webhook_signature(&body, signature)?;

    tracing::info!(event = %event.event, "razorpay webhook received");
    apply_subscription_event(&event).await?;

    Ok(ApiResponse::success(json!({ "received": true })))
}

async fn apply_subscription_event(event: &RazorpayEvent) -> Result<(), ApiError> {
    let Some(entity) = event.subscription_entity() else {
        tracing::debug!(event = %event.event, "ignoring non-subscription webhook event");
        return Ok(());
    };

    let subscriptions = SubscriptionService::new().await?;
    let subscription = match subscriptions
        .update_from_provider(&entity.id, &entity.status, entity.current_period_end())
        .await
    {
        Ok(subscription) => subscription,
        Err(SubscriptionError::NotFound(id)) => {
            // Events can arrive for checkouts that never hit this deployment
            tracing::warn!(subscription_id = %id, "webhook for unknown subscription");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let users = UserService::new().await?;
    let quota = &crate::config::config().quota;

    match entity.status.as_str() {
        "active" => {
            users
                .set_plan(
                    subscription.user_id,
                    "premium",
                    quota.premium_generation_limit,
                )
                .await?;
        }
        "cancelled" | "halted" | "completed" | "expired" => {
            users
                .set_plan(subscription.user_id, "free", quota.free_generation_limit)
                .await?;
        }
        _ => {}
    }

    Ok(())
}
