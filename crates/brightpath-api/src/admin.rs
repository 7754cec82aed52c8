use std::fmt::Write as _;

use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};

use brightpath_db::MoodFilter;
use brightpath_types::api::{AdminData, AdminFilter};
use brightpath_types::models::Confession;

use crate::auth::{AppState, db_call};
use crate::error::AppError;

/// Moods filtered by owner and/or label; journals and feedback unfiltered.
async fn aggregate(state: &AppState, filter: AdminFilter) -> Result<AdminData, AppError> {
    let filter = filter.normalized();
    db_call(state, move |s| {
        let moods = s.db.list_moods(MoodFilter {
            owner: filter.identity.as_deref(),
            mood: filter.mood.as_deref(),
        })?;
        let journals = s.db.list_journals(None)?;
        let feedbacks = s.db.list_feedback()?;
        Ok(AdminData {
            moods,
            journals,
            feedbacks,
        })
    })
    .await
}

pub async fn admin_data(
    State(state): State<AppState>,
    Query(filter): Query<AdminFilter>,
) -> Result<Json<AdminData>, AppError> {
    Ok(Json(aggregate(&state, filter).await?))
}

pub async fn admin_anonymous(State(state): State<AppState>) -> Result<Json<Vec<Confession>>, AppError> {
    let confessions = db_call(&state, |s| s.db.list_confessions()).await?;
    Ok(Json(confessions))
}

/// Server-rendered admin panel over the same aggregation.
pub async fn admin_page(
    State(state): State<AppState>,
    Query(filter): Query<AdminFilter>,
) -> Result<Html<String>, AppError> {
    let data = aggregate(&state, filter).await?;
    let confessions = db_call(&state, |s| s.db.list_confessions()).await?;
    Ok(Html(render_admin_page(&data, &confessions)))
}

fn render_admin_page(data: &AdminData, confessions: &[Confession]) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>BrightPath Admin</title>\n</head>\n<body>\n<h1>BrightPath Admin</h1>\n\
         <p><a href=\"/logout\">Log out</a></p>\n",
    );

    out.push_str("<h2>Moods</h2>\n<table>\n<tr><th>User</th><th>Mood</th><th>Stress</th><th>Date</th></tr>\n");
    for m in &data.moods {
        let stress = m.stress_level.map(|s| s.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(m.owner.as_deref().unwrap_or("-")),
            escape_html(&m.mood),
            stress,
            m.created_at.to_rfc3339(),
        );
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Journals</h2>\n<table>\n<tr><th>User</th><th>Entry</th><th>Date</th></tr>\n");
    for j in &data.journals {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&j.owner),
            escape_html(&j.content),
            j.created_at.to_rfc3339(),
        );
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Feedback</h2>\n<table>\n<tr><th>User</th><th>Message</th><th>Date</th></tr>\n");
    for f in &data.feedbacks {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(f.owner.as_deref().unwrap_or("-")),
            escape_html(&f.message),
            f.created_at.to_rfc3339(),
        );
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Anonymous messages</h2>\n<table>\n<tr><th>Message</th><th>Date</th></tr>\n");
    for c in confessions {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&c.message),
            c.created_at.to_rfc3339(),
        );
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
