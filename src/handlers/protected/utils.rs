use std::future::Future;

use serde_json::Value;

use crate::a4f::client::A4fError;
use crate::database::models::{Generation, User};
use crate::error::ApiError;
use crate::services::{GenerationService, QuotaClaim, UserService};

/// Shared generation lifecycle: claim quota, insert the pending row, call
/// the provider, settle the row to exactly one terminal status. The pending
/// row exists before the provider call, so a request that dies mid-flight
/// still leaves a record.
pub async fn run_generation<F, Fut>(
    user: &User,
    generation_type: &str,
    model: &str,
    prompt: Option<&str>,
    metadata: Value,
    call: F,
) -> Result<Generation, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, A4fError>>,
{
    let users = UserService::new().await?;
    let claim = users.claim_generation(user).await?;

    let generations = GenerationService::new().await?;
    let pending = match generations
        .create_pending(user.id, generation_type, model, prompt, &metadata)
        .await
    {
        Ok(row) => row,
        Err(e) => {
            release_if_metered(&users, user, claim).await;
            return Err(e.into());
        }
    };

    match call().await {
        Ok(result) => Ok(generations.complete(pending.id, &result).await?),
        Err(e) => {
            let message = e.to_string();
            if let Err(persist) = generations.fail(pending.id, &message).await {
                tracing::error!(
                    generation_id = %pending.id,
                    "failed to persist generation failure: {}",
                    persist
                );
            }
            // Failed calls do not consume free-tier quota
            release_if_metered(&users, user, claim).await;
            Err(e.into())
        }
    }
}

async fn release_if_metered(users: &UserService, user: &User, claim: QuotaClaim) {
    if claim == QuotaClaim::Metered {
        if let Err(e) = users.release_generation(user.id).await {
            tracing::error!(user_id = %user.id, "failed to release quota claim: {}", e);
        }
    }
}

/// Require a non-blank string field on a JSON payload.
pub fn require_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, ApiError> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("Missing required field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_str_accepts_present_field() {
        let payload = json!({ "model": "provider-2/flux.1-schnell" });
        assert_eq!(
            require_str(&payload, "model").unwrap(),
            "provider-2/flux.1-schnell"
        );
    }

    #[test]
    fn require_str_rejects_blank_and_missing() {
        let payload = json!({ "prompt": "   " });
        assert!(require_str(&payload, "prompt").is_err());
        assert!(require_str(&payload, "model").is_err());
    }

    #[test]
    fn require_str_rejects_non_string() {
        let payload = json!({ "model": 42 });
        assert!(require_str(&payload, "model").is_err());
    }
}
