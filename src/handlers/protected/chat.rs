use axum::{Extension, Json};
use serde_json::{json, Value};

use super::utils::{require_str, run_generation};
use crate::a4f::A4fClient;
use crate::database::models::generation::kind;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// POST /api/chat/completions - Chat completion proxy. The last user
/// message is recorded as the generation prompt; the full message list
/// stays in metadata.
pub async fn completions(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = require_str(&payload, "model")?.to_string();

    let messages = payload
        .get("messages")
        .and_then(|m| m.as_array())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: messages"))?;

    let prompt = last_user_message(messages);

    let a4f = A4fClient::from_config()?;
    let body = payload.clone();
    let generation = run_generation(
        &user,
        kind::CHAT,
        &model,
        prompt.as_deref(),
        payload,
        || async move { a4f.chat_completions(&body).await },
    )
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}

fn last_user_message(messages: &[Value]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.get("role").and_then(|r| r.as_str()) == Some("user"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_user_message_picks_most_recent() {
        let messages = vec![
            json!({ "role": "user", "content": "first" }),
            json!({ "role": "assistant", "content": "reply" }),
            json!({ "role": "user", "content": "second" }),
        ];
        assert_eq!(last_user_message(&messages).as_deref(), Some("second"));
    }

    #[test]
    fn last_user_message_handles_structured_content() {
        let messages = vec![json!({ "role": "user", "content": [{ "type": "text" }] })];
        assert_eq!(last_user_message(&messages), None);
    }
}
