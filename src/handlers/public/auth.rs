use axum::{
    extract::Query,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::supabase::{SignupOutcome, SupabaseClient, SupabaseSession};
use crate::auth::{expired_session_cookie, session_cookie, session_jar, SessionTokens};
use crate::error::ApiError;
use crate::middleware::auth::session_token;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error_description: Option<String>,
}

/// POST /api/auth/signup - Create an account and start a session
///
/// Expected Input:
/// ```json
/// {
///   "email": "string",
///   "password": "string",
///   "firstName": "string (optional)",
///   "lastName": "string (optional)"
/// }
/// ```
pub async fn signup(
    headers: HeaderMap,
    Json(payload): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let supabase = SupabaseClient::from_config()?;
    let outcome = supabase
        .sign_up(
            payload.email.trim(),
            &payload.password,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .await?;

    match outcome {
        SignupOutcome::Session(session) => {
            let response = session_response(&session).await?;
            Ok(with_session(&headers, &session, response))
        }
        SignupOutcome::ConfirmationRequired(_) => Ok(ApiResponse::success(json!({
            "message": "Check your email to confirm your account"
        }))
        .into_response()),
    }
}

/// POST /api/auth/signin - Password sign-in; sets the session cookie and
/// returns the user plus an access token for bearer-style clients
pub async fn signin(
    headers: HeaderMap,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let supabase = SupabaseClient::from_config()?;
    let session = supabase
        .sign_in(payload.email.trim(), &payload.password)
        .await?;

    let response = session_response(&session).await?;
    Ok(with_session(&headers, &session, response))
}

/// POST /api/auth/signout - Revoke the session and clear the cookie
pub async fn signout(headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        if let Ok(supabase) = SupabaseClient::from_config() {
            // Best-effort: a failed revoke only means the token lives until expiry
            if let Err(e) = supabase.sign_out(&token).await {
                tracing::warn!("session revoke failed: {}", e);
            }
        }
    }

    let response = ApiResponse::success(json!({ "message": "Signed out" })).into_response();
    Ok(match session_jar(&headers) {
        Some(jar) => (jar.add(expired_session_cookie()), response).into_response(),
        None => response,
    })
}

/// GET /api/auth/user - Resolve the current session to its account row
pub async fn current_user(headers: HeaderMap) -> ApiResult<Value> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing session token"))?;

    let supabase = SupabaseClient::from_config()?;
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

    Ok(ApiResponse::success(json!({ "user": user })))
}

/// POST /api/auth/reset-password - Send a password recovery email
pub async fn reset_password(Json(payload): Json<ResetPasswordRequest>) -> ApiResult<Value> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let supabase = SupabaseClient::from_config()?;
    let redirect_to = format!("{}/update-password", base_url()?);
    supabase.recover(payload.email.trim(), &redirect_to).await?;

    Ok(ApiResponse::success(json!({
        "message": "Password reset email sent"
    })))
}

/// POST /api/auth/update-password - Set a new password for the session
/// behind the bearer token (a recovery session from the reset email)
pub async fn update_password(
    headers: HeaderMap,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Value> {
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let token = session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing session token"))?;

    let supabase = SupabaseClient::from_config()?;
    supabase.update_password(&token, &payload.password).await?;

    Ok(ApiResponse::success(json!({
        "message": "Password updated"
    })))
}

/// GET /api/auth/google - Authorize URL for the hosted Google OAuth flow
pub async fn google() -> ApiResult<Value> {
    let supabase = SupabaseClient::from_config()?;
    let redirect_to = format!("{}/auth/callback", base_url()?);

    Ok(ApiResponse::success(json!({
        "url": supabase.authorize_url("google", &redirect_to)
    })))
}

/// GET /auth/callback - OAuth redirect target; exchanges the code for a
/// session, sets the cookie, and sends the browser back to the app
pub async fn oauth_callback(
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let base = base_url()?;

    let Some(code) = query.code else {
        let reason = query
            .error_description
            .unwrap_or_else(|| "Missing authorization code".to_string());
        tracing::warn!("oauth callback rejected: {}", reason);
        return Ok(Redirect::to(&format!("{}/?auth_error=1", base)).into_response());
    };

    let supabase = SupabaseClient::from_config()?;
    let session = supabase.exchange_code(&code).await?;

    // Ensure the local account exists before the browser lands back on the app
    session_response(&session).await?;

    Ok(with_session(
        &headers,
        &session,
        Redirect::to(&base).into_response(),
    ))
}

/// Upsert the local account for a fresh session and build the JSON body
/// shared by signup/signin.
async fn session_response(session: &SupabaseSession) -> Result<Response, ApiError> {
    let email = session
        .user
        .email
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Session has no email identity"))?;

    let users = UserService::new().await?;
    let user = users
        .find_or_create_by_email(
            email,
            session.user.first_name(),
            session.user.last_name(),
            session.user.avatar_url(),
        )
        .await?;

    Ok(ApiResponse::success(json!({
        "user": user,
        "accessToken": session.access_token,
    }))
    .into_response())
}

/// Attach the signed session cookie when SESSION_SECRET is configured;
/// bearer-only deployments just get the JSON body.
fn with_session(headers: &HeaderMap, session: &SupabaseSession, response: Response) -> Response {
    let tokens = SessionTokens {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
    };

    match session_jar(headers) {
        Some(jar) => (jar.add(session_cookie(&tokens)), response).into_response(),
        None => response,
    }
}

fn base_url() -> Result<String, ApiError> {
    crate::config::required_env("BASE_URL")
        .map(|v| v.trim_end_matches('/').to_string())
        .map_err(|var| ApiError::service_unavailable(format!("{} not configured", var)))
}
