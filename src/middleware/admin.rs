use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;

/// Admin gate. Runs after `auth_middleware`, so a missing extension means a
/// route was wired without the session layer.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Missing session token"))?;

    if !current.0.is_admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
