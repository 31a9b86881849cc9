use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::blog_service::{BlogPostPatch, NewBlogPost};
use crate::services::BlogService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

/// POST /api/admin/blog - Create a post; the slug is derived from the title
/// and suffixed until unique
pub async fn create(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Value> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("Title and content are required"));
    }

    let post = BlogService::new()
        .await?
        .create(NewBlogPost {
            title: payload.title.trim().to_string(),
            excerpt: payload.excerpt,
            content: payload.content,
            cover_image_url: payload.cover_image_url,
            published: payload.published.unwrap_or(false),
            author_id: Some(user.id),
        })
        .await?;

    Ok(ApiResponse::created(json!({ "post": post })))
}

/// PUT /api/admin/blog/:id - Partial update; the slug stays stable so
/// published URLs never break
pub async fn update(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Value> {
    let post = BlogService::new()
        .await?
        .update(
            id,
            BlogPostPatch {
                title: payload.title,
                excerpt: payload.excerpt,
                content: payload.content,
                cover_image_url: payload.cover_image_url,
                published: payload.published,
            },
        )
        .await?;

    Ok(ApiResponse::success(json!({ "post": post })))
}

/// DELETE /api/admin/blog/:id
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    BlogService::new().await?.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
