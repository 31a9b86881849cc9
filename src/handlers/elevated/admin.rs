use serde_json::{json, Map, Value};

use crate::database::models::generation::status;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{BlogService, GenerationService, SubscriptionService, UserService};

/// GET /api/admin/users - All accounts, newest first
pub async fn users() -> ApiResult<Value> {
    let users = UserService::new().await?.list_all().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// GET /api/admin/stats - Platform totals for the dashboard
pub async fn stats() -> ApiResult<Value> {
    let users = UserService::new().await?;
    let generations = GenerationService::new().await?;
    let blog = BlogService::new().await?;
    let subscriptions = SubscriptionService::new().await?;

    let mut by_type = Map::new();
    for (generation_type, count) in generations.counts_by_type().await? {
        by_type.insert(generation_type, json!(count));
    }

    Ok(ApiResponse::success(json!({
        "totalUsers": users.count().await?,
        "totalGenerations": generations.count().await?,
        "completedGenerations": generations.count_by_status(status::COMPLETED).await?,
        "failedGenerations": generations.count_by_status(status::FAILED).await?,
        "generationsByType": Value::Object(by_type),
        "publishedPosts": blog.published_count().await?,
        "activeSubscriptions": subscriptions.active_count().await?,
    })))
}
