use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::supabase::SupabaseClient;
use crate::auth::{session_jar, tokens_from_jar};
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::UserService;

/// Authenticated user context resolved from the session.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Session middleware. Accepts a bearer access token or the signed session
/// cookie, re-validates it against the hosted auth service on every request
/// (no local token verification), and attaches the local account row.
pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing session token"))?;

    let supabase = SupabaseClient::from_config().map_err(ApiError::from)?;
    let auth_user = supabase
        .get_user(&token)
        .await
        .map_err(|_| ApiError::unauthorized("Invalid or expired session"))?;

    let email = auth_user
        .email
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Session has no email identity"))?;

    let users = UserService::new().await?;
    let user = users
        .find_or_create_by_email(
            email,
            auth_user.first_name(),
            auth_user.last_name(),
            auth_user.avatar_url(),
        )
        .await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Pull the access token from the Authorization header, falling back to the
/// signed session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }

    let jar = session_jar(headers)?;
    tokens_from_jar(&jar).map(|tokens| tokens.access_token)
}

/// Extract a bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn bearer_token_rejects_missing_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_rejects_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
