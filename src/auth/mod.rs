use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod supabase;

/// Name of the signed session cookie holding the Supabase token pair.
pub const SESSION_COOKIE: &str = "loveaihub_session";

/// Supabase access/refresh token pair carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Cookie signing key derived from SESSION_SECRET. The secret is stretched
/// to the 64 bytes the cookie key requires, so operators can use any
/// reasonably long random string.
pub fn session_key() -> Result<Key, &'static str> {
    let secret = crate::config::required_env("SESSION_SECRET")?;

    let mut material = [0u8; 64];
    let first = Sha256::digest(secret.as_bytes());
    let mut chained = Sha256::new();
    chained.update(first);
    chained.update(secret.as_bytes());
    let second = chained.finalize();
    material[..32].copy_from_slice(&first);
    material[32..].copy_from_slice(&second);

    Ok(Key::from(&material))
}

/// Signed cookie jar for the incoming request, or None when SESSION_SECRET
/// is not configured (bearer-only deployments).
pub fn session_jar(headers: &HeaderMap) -> Option<SignedCookieJar> {
    let key = session_key().ok()?;
    Some(SignedCookieJar::from_headers(headers, key))
}

pub fn tokens_from_jar(jar: &SignedCookieJar) -> Option<SessionTokens> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

pub fn session_cookie(tokens: &SessionTokens) -> Cookie<'static> {
    let value = serde_json::to_string(tokens).unwrap_or_default();
    let secure = crate::config::config().security.secure_cookies;

    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_deterministic() {
        std::env::set_var("SESSION_SECRET", "an adequately long session secret");
        let a = session_key().unwrap();
        let b = session_key().unwrap();
        assert_eq!(a.master(), b.master());
    }

    #[test]
    fn session_tokens_round_trip() {
        let tokens = SessionTokens {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
        };
        let json = serde_json::to_string(&tokens).unwrap();
        let parsed: SessionTokens = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.access_token, "access");
        assert_eq!(parsed.refresh_token, "refresh");
    }
}
