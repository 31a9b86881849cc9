use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Billing not configured: {0}")]
    MissingConfig(&'static str),
    #[error("Payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Invalid webhook signature")]
    InvalidSignature,
}

/// Subscription object as the payment provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpaySubscription {
    pub id: String,
    pub plan_id: String,
    pub status: String,
    pub current_end: Option<i64>,
    pub short_url: Option<String>,
}

impl RazorpaySubscription {
    /// Provider timestamps are unix seconds.
    pub fn current_period_end(&self) -> Option<DateTime<Utc>> {
        self.current_end.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }
}

#[derive(Debug, Deserialize)]
pub struct RazorpayEvent {
    pub event: String,
    pub payload: Value,
}

impl RazorpayEvent {
    /// Webhook payloads nest the entity under `payload.subscription.entity`.
    pub fn subscription_entity(&self) -> Option<RazorpaySubscription> {
        let entity = self.payload.get("subscription")?.get("entity")?;
        serde_json::from_value(entity.clone()).ok()
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorEnvelope {
    error: RazorpayErrorDetails,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetails {
    code: Option<String>,
    description: Option<String>,
}

/// Minimal Razorpay client built on reqwest. API calls authenticate with
/// HTTP basic auth (key id / key secret); webhooks are verified with the
/// dedicated webhook secret.
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    webhook_secret: Option<String>,
}

impl RazorpayClient {
    pub fn from_config() -> Result<Self, BillingError> {
        let key_id =
            crate::config::required_env("RAZORPAY_KEY_ID").map_err(BillingError::MissingConfig)?;
        let key_secret = crate::config::required_env("RAZORPAY_KEY_SECRET")
            .map_err(BillingError::MissingConfig)?;
        let webhook_secret = crate::config::required_env("RAZORPAY_WEBHOOK_SECRET").ok();

        Ok(Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
            webhook_secret,
        })
    }

    #[cfg(test)]
    fn with_credentials(key_id: &str, key_secret: &str, webhook_secret: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            webhook_secret: webhook_secret.map(|s| s.to_string()),
        }
    }

    /// Public key id, safe to hand to the checkout client.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a subscription for a plan.
    /// https://razorpay.com/docs/api/payments/subscriptions/#create-a-subscription
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        total_count: u32,
        notes: HashMap<String, String>,
    ) -> Result<RazorpaySubscription, BillingError> {
        let body = json!({
            "plan_id": plan_id,
            "total_count": total_count,
            "customer_notify": 1,
            "notes": notes,
        });

        let resp = self
            .http
            .post(format!("{}/subscriptions", RAZORPAY_API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create subscription").await?;

        Ok(resp.json().await?)
    }

    /// Verify the `X-Razorpay-Signature` header: hex HMAC-SHA256 of the raw
    /// body under the webhook secret.
    /// https://razorpay.com/docs/webhooks/validate-test/
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<RazorpayEvent, BillingError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(BillingError::MissingConfig("RAZORPAY_WEBHOOK_SECRET"))?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| BillingError::InvalidSignature)?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        let provided = signature.trim();
        if expected.len() != provided.len()
            || !expected.bytes().zip(provided.bytes()).all(|(a, b)| a == b)
        {
            return Err(BillingError::InvalidSignature);
        }

        let event: RazorpayEvent =
            serde_json::from_slice(payload).map_err(|_| BillingError::InvalidSignature)?;
        Ok(event)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, BillingError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        let (code, description) = match serde_json::from_str::<RazorpayErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.description),
            Err(_) => (None, None),
        };

        error!(
            status = %status,
            razorpay_error_code = ?code,
            razorpay_error_description = ?description,
            response_body = %body,
            context = %context,
            "razorpay api request failed"
        );

        let message = description
            .unwrap_or_else(|| format!("{} failed with status {}", context, status));

        Err(BillingError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn webhook_signature_accepts_valid() {
        let client = RazorpayClient::with_credentials("key", "secret", Some("whsec"));
        let payload = br#"{"event":"subscription.activated","payload":{}}"#;
        let signature = sign("whsec", payload);

        let event = client.verify_webhook_signature(payload, &signature).unwrap();
        assert_eq!(event.event, "subscription.activated");
    }

    #[test]
    fn webhook_signature_rejects_tampered_payload() {
        let client = RazorpayClient::with_credentials("key", "secret", Some("whsec"));
        let signature = sign("whsec", br#"{"event":"subscription.activated","payload":{}}"#);

        let tampered = br#"{"event":"subscription.cancelled","payload":{}}"#;
        assert!(matches!(
            client.verify_webhook_signature(tampered, &signature),
            Err(BillingError::InvalidSignature)
        ));
    }

    #[test]
    fn webhook_signature_requires_configured_secret() {
        let client = RazorpayClient::with_credentials("key", "secret", None);
        assert!(matches!(
            client.verify_webhook_signature(b"{}", "00"),
            Err(BillingError::MissingConfig(_))
        ));
    }

    #[test]
    fn subscription_entity_extracts_nested_payload() {
        let event = RazorpayEvent {
            event: "subscription.activated".into(),
            payload: json!({
                "subscription": {
                    "entity": {
                        "id": "sub_123",
                        "plan_id": "plan_premium",
                        "status": "active",
                        "current_end": 1735689600,
                        "short_url": null
                    }
                }
            }),
        };

        let entity = event.subscription_entity().unwrap();
        assert_eq!(entity.id, "sub_123");
        assert_eq!(entity.status, "active");
        assert!(entity.current_period_end().is_some());
    }
}
