use std::collections::HashMap;

use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::billing::RazorpayClient;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::SubscriptionService;

/// Billing cycles charged before the provider marks the subscription
/// completed.
const SUBSCRIPTION_CYCLES: u32 = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_id: String,
}

/// POST /api/subscribe - Create a provider subscription and record it
///
/// Returns the checkout parameters the web client feeds to the payment
/// widget; the row stays `created` until the webhook reports activation.
pub async fn subscribe(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SubscribeRequest>,
) -> ApiResult<Value> {
    if payload.plan_id.trim().is_empty() {
        return Err(ApiError::bad_request("Missing required field: planId"));
    }

    let razorpay = RazorpayClient::from_config()?;

    let mut notes = HashMap::new();
    notes.insert("user_id".to_string(), user.id.to_string());
    notes.insert("email".to_string(), user.email.clone());

    let provider_subscription = razorpay
        .create_subscription(payload.plan_id.trim(), SUBSCRIPTION_CYCLES, notes)
        .await?;

    SubscriptionService::new()
        .await?
        .create(
            user.id,
            &provider_subscription.id,
            payload.plan_id.trim(),
            &provider_subscription.status,
        )
        .await?;

    Ok(ApiResponse::success(json!({
        "subscriptionId": provider_subscription.id,
        "razorpayKeyId": razorpay.key_id(),
        "status": provider_subscription.status,
        "shortUrl": provider_subscription.short_url,
    })))
}
