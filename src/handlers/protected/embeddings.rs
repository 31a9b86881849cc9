use axum::{Extension, Json};
use serde_json::{json, Value};

use super::utils::{require_str, run_generation};
use crate::a4f::A4fClient;
use crate::database::models::generation::kind;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// POST /api/embeddings - Embedding proxy. Runs the same request lifecycle
/// as the media endpoints; string inputs are recorded as the prompt.
pub async fn create(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = require_str(&payload, "model")?.to_string();

    if payload.get("input").is_none() {
        return Err(ApiError::bad_request("Missing required field: input"));
    }
    let prompt = payload
        .get("input")
        .and_then(|i| i.as_str())
        .map(String::from);

    let a4f = A4fClient::from_config()?;
    let body = payload.clone();
    let generation = run_generation(
        &user,
        kind::EMBEDDING,
        &model,
        prompt.as_deref(),
        payload,
        || async move { a4f.embeddings(&body).await },
    )
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}
