use axum::Json;
use axum::response::Redirect;
use serde_json::{Value, json};

// The HTML pages themselves are served straight from the public directory
// by `tower_http::services::ServeFile` / `ServeDir` in `routes`.

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The raw file would otherwise be reachable through the `ServeDir`
/// fallback without a session.
pub async fn dashboard_file() -> Redirect {
    Redirect::to("/dashboard")
}
