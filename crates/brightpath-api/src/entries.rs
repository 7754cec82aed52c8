use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use brightpath_db::MoodFilter;
use brightpath_types::api::{JournalRequest, MessageRequest, MoodRequest, SubmitAck};
use brightpath_types::models::{JournalEntry, MoodEntry};

use crate::auth::{AppState, db_call, required};
use crate::config::SubmitResponse;
use crate::error::AppError;
use crate::extract::FormOrJson;
use crate::middleware::current_session;
use crate::session::CurrentUser;

/// Redirect back to the dashboard or a bare 200, per config.
fn submitted(state: &AppState) -> Response {
    match state.config.submit_response {
        SubmitResponse::Redirect => Redirect::to("/dashboard").into_response(),
        SubmitResponse::Status => Json(SubmitAck { ok: true }).into_response(),
    }
}

pub async fn submit_mood(
    State(state): State<AppState>,
    user: CurrentUser,
    FormOrJson(req): FormOrJson<MoodRequest>,
) -> Result<Response, AppError> {
    let mood = required(req.mood, "Mood is required")?;
    let stress_level = req.stress_level;

    let entry = db_call(&state, move |s| {
        s.db.insert_mood(Some(&user.identity), &mood, stress_level)
    })
    .await?;
    debug!("Stored mood {}", entry.id);

    Ok(submitted(&state))
}

pub async fn submit_journal(
    State(state): State<AppState>,
    user: CurrentUser,
    FormOrJson(req): FormOrJson<JournalRequest>,
) -> Result<Response, AppError> {
    let content = required(req.content, "Content is required")?;

    let entry = db_call(&state, move |s| s.db.insert_journal(&user.identity, &content)).await?;
    debug!("Stored journal entry {}", entry.id);

    Ok(submitted(&state))
}

/// Anonymous channel. Takes no session or cookie extractor, so nothing about
/// the caller can reach the store even when they are logged in.
pub async fn submit_confession(
    State(state): State<AppState>,
    FormOrJson(req): FormOrJson<MessageRequest>,
) -> Result<Response, AppError> {
    let message = required(req.message, "Message required")?;

    let entry = db_call(&state, move |s| s.db.insert_confession(&message)).await?;
    debug!("Stored confession {}", entry.id);

    Ok(submitted(&state))
}

/// Feedback behind `require_auth`; always stamped with the caller.
pub async fn submit_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    FormOrJson(req): FormOrJson<MessageRequest>,
) -> Result<Response, AppError> {
    let message = required(req.message, "Message required")?;

    let entry = db_call(&state, move |s| {
        s.db.insert_feedback(Some(&user.identity), &message)
    })
    .await?;
    debug!("Stored feedback {}", entry.id);

    Ok(submitted(&state))
}

/// Feedback open to everyone; stamped with the caller only if a valid
/// session happens to be present.
pub async fn submit_open_feedback(
    State(state): State<AppState>,
    jar: CookieJar,
    FormOrJson(req): FormOrJson<MessageRequest>,
) -> Result<Response, AppError> {
    let message = required(req.message, "Message required")?;
    let owner = current_session(&state, &jar).await?.map(|u| u.identity);

    let entry = db_call(&state, move |s| s.db.insert_feedback(owner.as_deref(), &message)).await?;
    debug!("Stored feedback {}", entry.id);

    Ok(submitted(&state))
}

pub async fn my_moods(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MoodEntry>>, AppError> {
    let moods = db_call(&state, move |s| {
        s.db.list_moods(MoodFilter {
            owner: Some(&user.identity),
            mood: None,
        })
    })
    .await?;
    Ok(Json(moods))
}

pub async fn my_journals(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let journals = db_call(&state, move |s| s.db.list_journals(Some(&user.identity))).await?;
    Ok(Json(journals))
}
