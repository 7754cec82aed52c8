use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::{AppState, db_call};
use crate::error::AppError;
use crate::session::{CurrentUser, LOGIN_PAGE, SESSION_COOKIE};

/// Resolves the session cookie to a live session, if there is one.
/// Forged, expired and unknown ids all come back as `None`.
pub async fn current_session(state: &AppState, jar: &CookieJar) -> Result<Option<CurrentUser>, AppError> {
    let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.session_key.verify(c.value()).map(str::to_string))
    else {
        return Ok(None);
    };

    let row = db_call(state, move |s| s.db.get_session(&session_id)).await?;

    Ok(row.filter(|r| !r.identity.trim().is_empty()).map(|r| CurrentUser {
        session_id: r.id,
        identity: r.identity,
        role: r.role,
    }))
}

/// Lets the request through only with a valid session; otherwise redirects
/// to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match current_session(&state, &jar).await? {
        Some(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        None => Ok(Redirect::to(LOGIN_PAGE).into_response()),
    }
}

/// Like `require_auth`, but a logged-in non-admin gets a 403 instead of the
/// page.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user) = current_session(&state, &jar).await? else {
        return Ok(Redirect::to(LOGIN_PAGE).into_response());
    };

    if !user.role.is_admin() {
        warn!("Admin route {} denied for role {}", req.uri().path(), user.role);
        return Err(AppError::Authorization);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
