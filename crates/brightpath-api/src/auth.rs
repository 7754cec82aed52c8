use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, warn};

use brightpath_db::{Database, UserInsert};
use brightpath_types::api::{LoginRequest, SignupRequest};

use crate::config::Config;
use crate::error::AppError;
use crate::extract::FormOrJson;
use crate::session::{self, LOGIN_PAGE, SESSION_COOKIE, SessionKey};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    pub session_key: SessionKey,
    hasher: Argon2<'static>,
    // Verified against when the identity is unknown, so a miss costs the
    // same as a wrong password.
    dummy_hash: String,
}

impl AppStateInner {
    pub fn new(db: Database, config: Config) -> anyhow::Result<Self> {
        Self::with_hasher(db, config, Argon2::default())
    }

    pub fn with_hasher(db: Database, config: Config, hasher: Argon2<'static>) -> anyhow::Result<Self> {
        let session_key = SessionKey::new(&config.session_secret)?;
        let dummy_hash = hash_password(&hasher, "brightpath-dummy-password")?;
        Ok(Self {
            db,
            config,
            session_key,
            hasher,
            dummy_hash,
        })
    }
}

/// Seeds every configured admin identity with the configured password, or
/// takes over the account if someone already registered it. Runs once at
/// startup, before the listener is bound.
pub fn bootstrap_admins(state: &AppStateInner) -> anyhow::Result<usize> {
    let Some(password) = state.config.admin_password.as_deref() else {
        return Ok(0);
    };

    for identity in &state.config.admin_identities {
        let hash = hash_password(&state.hasher, password)?;
        if state.db.upsert_admin(identity, &hash)? {
            info!("Seeded admin account {}", identity);
        } else {
            info!("Promoted existing account {} to admin", identity);
        }
    }
    Ok(state.config.admin_identities.len())
}

/// Runs a blocking store call off the async runtime.
pub(crate) async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppStateInner) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Store(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(AppError::from)
}

/// Trimmed, non-empty value or a validation error with `message`.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

pub async fn signup(
    State(state): State<AppState>,
    FormOrJson(req): FormOrJson<SignupRequest>,
) -> Result<Response, AppError> {
    let identity = required(req.identity, "Missing fields")?;
    // Passwords are taken verbatim; only emptiness is checked.
    let password = req
        .password
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing fields".into()))?;
    let display_name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    // Self-service accounts never start out as admin.
    let role = state.config.default_role;

    let outcome = db_call(&state, {
        let identity = identity.clone();
        move |s| {
            // Fast path; the UNIQUE index below is what actually decides.
            if s.db.get_user_by_identity(&identity)?.is_some() {
                return Ok(UserInsert::Duplicate);
            }
            let hash = hash_password(&s.hasher, &password)?;
            s.db.create_user(&identity, display_name.as_deref(), &hash, role)
        }
    })
    .await?;

    match outcome {
        UserInsert::Created => {
            info!("New {} account created", role);
            Ok(Redirect::to(LOGIN_PAGE).into_response())
        }
        UserInsert::Duplicate => Err(AppError::Conflict("User already exists".into())),
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    FormOrJson(req): FormOrJson<LoginRequest>,
) -> Result<Response, AppError> {
    let identity = required(req.identity, "Missing fields")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Missing fields".into()))?;

    let user = db_call(&state, {
        let identity = identity.clone();
        move |s| {
            let user = s.db.get_user_by_identity(&identity)?;
            let stored = user.as_ref().map_or(s.dummy_hash.as_str(), |u| u.password_hash.as_str());
            let ok = verify_password(&s.hasher, &password, stored)?;
            Ok(user.filter(|_| ok))
        }
    })
    .await?;

    let Some(user) = user else {
        warn!("Rejected login attempt");
        return Err(AppError::Authentication);
    };

    let stale = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.session_key.verify(c.value()).map(str::to_string));
    let session_id = session::new_session_id();
    let ttl = chrono::Duration::hours(state.config.session_ttl_hours);

    db_call(&state, {
        let session_id = session_id.clone();
        let identity = user.identity.clone();
        let role = user.role;
        move |s| {
            if let Some(old) = stale {
                s.db.delete_session(&old)?;
            }
            s.db.create_session(&session_id, &identity, role, ttl)
        }
    })
    .await?;

    info!("Login succeeded (role {})", user.role);

    let cookie = session::session_cookie(
        state.session_key.sign(&session_id),
        state.config.session_ttl_hours,
        state.config.cookie_secure,
    );
    let target = if user.role.is_admin() { "/admin" } else { "/dashboard" };

    Ok((jar.add(cookie), Redirect::to(target)).into_response())
}

/// Always succeeds; a missing or forged cookie just means there is nothing
/// to destroy.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.session_key.verify(c.value()).map(str::to_string));

    if let Some(id) = session_id {
        db_call(&state, move |s| s.db.delete_session(&id)).await?;
    }

    Ok((jar.remove(session::removal_cookie()), Redirect::to(LOGIN_PAGE)).into_response())
}

fn hash_password(hasher: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
fn verify_password(hasher: &Argon2<'_>, password: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {}", e))?;
    Ok(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
}
