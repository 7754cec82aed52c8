//! Session cookie codec.
//!
//! The cookie carries `<session-id>.<hex HMAC-SHA256(secret, session-id)>`.
//! The session itself (identity + role snapshot) lives server-side in the
//! `sessions` table; the signature only lets us reject forged ids without a
//! store round-trip.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use brightpath_types::models::Role;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::config::ConfigError;

pub const SESSION_COOKIE: &str = "brightpath_sid";
pub const LOGIN_PAGE: &str = "/login";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SessionKey {
    mac: HmacSha256,
}

impl SessionKey {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| ConfigError::WeakSecret)?;
        Ok(Self { mac })
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        format!("{}.{}", session_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the session id if the signature checks out.
    pub fn verify<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (session_id, sig) = cookie_value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(session_id)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// 32 random bytes, base64url without padding (never contains '.').
pub fn new_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    B64.encode(bytes)
}

pub fn session_cookie(value: String, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

/// Cookie to hand to `CookieJar::remove`; path must match the one we set.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// The logged-in caller, placed into request extensions by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub session_id: String,
    pub identity: String,
    pub role: Role,
}

/// Handlers behind `require_auth` read the caller through this. Without the
/// gate there is nothing in the extensions and the caller is sent to login.
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Redirect::to(LOGIN_PAGE).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        SessionKey::new("0123456789abcdef0123").unwrap()
    }

    #[test]
    fn signed_value_verifies() {
        let key = key();
        let sid = new_session_id();
        let value = key.sign(&sid);
        assert_eq!(key.verify(&value), Some(sid.as_str()));
    }

    #[test]
    fn tampered_values_are_rejected() {
        let key = key();
        let value = key.sign("abc");

        let forged = value.replacen("abc", "abd", 1);
        assert_eq!(key.verify(&forged), None);
        assert_eq!(key.verify("abc"), None);
        assert_eq!(key.verify("abc.zz"), None);
        assert_eq!(key.verify(".deadbeef"), None);
    }

    #[test]
    fn other_secret_is_rejected() {
        let value = key().sign("abc");
        let other = SessionKey::new("another-secret-of-length").unwrap();
        assert_eq!(other.verify(&value), None);
    }

    #[test]
    fn session_ids_are_unique_and_dot_free() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('.'));
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("v".into(), 24, true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
        assert_eq!(cookie.path(), Some("/"));
    }
}
