use axum::extract::Path;
use serde_json::{json, Value};

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::BlogService;

/// GET /api/blog - Published posts, newest first
pub async fn list() -> ApiResult<Value> {
    let posts = BlogService::new().await?.list_published().await?;
    Ok(ApiResponse::success(json!({ "posts": posts })))
}

/// GET /api/blog/:slug - Single published post; each successful fetch bumps
/// the view counter by exactly one
pub async fn get_by_slug(Path(slug): Path<String>) -> ApiResult<Value> {
    let post = BlogService::new().await?.get_by_slug(&slug).await?;
    Ok(ApiResponse::success(json!({ "post": post })))
}
