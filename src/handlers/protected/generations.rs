use axum::{extract::Query, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::GenerationService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/generations - The caller's generation history, newest first
pub async fn list(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let default_limit = crate::config::config().api.generations_page_limit;
    let limit = query.limit.unwrap_or(default_limit).clamp(1, 200);

    let generations = GenerationService::new()
        .await?
        .list_for_user(user.id, limit)
        .await?;

    Ok(ApiResponse::success(json!({ "generations": generations })))
}
