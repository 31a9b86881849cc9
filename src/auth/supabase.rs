use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth service not configured: {0}")]
    MissingConfig(&'static str),
    #[error("Auth service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// User record as the hosted auth service reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl SupabaseUser {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn first_name(&self) -> Option<&str> {
        self.metadata_str("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.metadata_str("last_name")
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.metadata_str("avatar_url").or_else(|| self.metadata_str("picture"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SupabaseUser,
}

/// Result of a signup: hosted projects with email confirmation enabled
/// return a bare user and no session until the address is verified.
#[derive(Debug)]
pub enum SignupOutcome {
    Session(SupabaseSession),
    ConfirmationRequired(SupabaseUser),
}

/// Client for the hosted Supabase auth (GoTrue) API. Session validation is
/// delegated here on every request; this service never verifies tokens
/// locally.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn from_config() -> Result<Self, AuthError> {
        let base_url =
            crate::config::required_env("SUPABASE_URL").map_err(AuthError::MissingConfig)?;
        let anon_key =
            crate::config::required_env("SUPABASE_ANON_KEY").map_err(AuthError::MissingConfig)?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<SignupOutcome, AuthError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": {
                "first_name": first_name,
                "last_name": last_name,
            }
        });

        let resp = self
            .http
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "signup").await?;

        let payload: Value = resp.json().await?;
        if payload.get("access_token").is_some() {
            let session: SupabaseSession =
                serde_json::from_value(payload).map_err(|e| AuthError::Rejected {
                    status: 502,
                    message: format!("unexpected signup response: {}", e),
                })?;
            Ok(SignupOutcome::Session(session))
        } else {
            // GoTrue nests the user under "user" for some configurations and
            // returns it bare for others.
            let user_value = payload.get("user").cloned().unwrap_or(payload);
            let user: SupabaseUser =
                serde_json::from_value(user_value).map_err(|e| AuthError::Rejected {
                    status: 502,
                    message: format!("unexpected signup response: {}", e),
                })?;
            Ok(SignupOutcome::ConfirmationRequired(user))
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SupabaseSession, AuthError> {
        let resp = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "signin").await?;

        Ok(resp.json().await?)
    }

    /// Revoke the session server-side; a failed revoke only means the token
    /// lives until expiry, so callers treat this as best-effort.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::ensure_success(resp, "signout").await?;
        Ok(())
    }

    /// Resolve the user behind an access token. This is the per-request
    /// validation path used by the auth middleware.
    pub async fn get_user(&self, access_token: &str) -> Result<SupabaseUser, AuthError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "user lookup").await?;

        Ok(resp.json().await?)
    }

    pub async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/recover", self.base_url))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::ensure_success(resp, "password recovery").await?;
        Ok(())
    }

    /// Set a new password for the session behind the token (a recovery
    /// session from the reset email, or a regular signed-in session).
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<SupabaseUser, AuthError> {
        let resp = self
            .http
            .put(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": password }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "password update").await?;

        Ok(resp.json().await?)
    }

    /// Authorize URL for a hosted OAuth provider flow (no network call).
    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}",
            self.base_url,
            provider,
            urlencode(redirect_to)
        )
    }

    /// Exchange an OAuth callback code for a session.
    pub async fn exchange_code(&self, code: &str) -> Result<SupabaseSession, AuthError> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/token?grant_type=pkce", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "auth_code": code }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "code exchange").await?;

        Ok(resp.json().await?)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, AuthError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = gotrue_message(&body)
            .unwrap_or_else(|| format!("{} failed with status {}", context, status));

        error!(
            status = %status,
            context = %context,
            response_body = %body,
            "auth service request failed"
        );

        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// GoTrue error bodies vary by endpoint generation; probe the known keys.
fn gotrue_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;

    for key in ["error_description", "msg", "message", "error"] {
        if let Some(msg) = parsed.get(key).and_then(|m| m.as_str()) {
            return Some(msg.to_string());
        }
    }
    None
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gotrue_message_probes_known_keys() {
        assert_eq!(
            gotrue_message(r#"{"error_description":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            gotrue_message(r#"{"msg":"Email not confirmed"}"#).as_deref(),
            Some("Email not confirmed")
        );
        assert_eq!(gotrue_message("not json"), None);
    }

    #[test]
    fn user_metadata_accessors() {
        let user = SupabaseUser {
            id: "abc".into(),
            email: Some("a@b.co".into()),
            user_metadata: json!({ "first_name": "Ada", "picture": "https://img" }),
        };
        assert_eq!(user.first_name(), Some("Ada"));
        assert_eq!(user.last_name(), None);
        assert_eq!(user.avatar_url(), Some("https://img"));
    }
}
