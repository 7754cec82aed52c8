use axum::{
    Router, middleware,
    routing::{get, get_service, post},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::auth::{self, AppState};
use crate::config::FeedbackMode;
use crate::entries;
use crate::middleware::{require_admin, require_auth};
use crate::pages;

/// Full HTTP surface. Which route `/feedback` lands on depends on
/// `FeedbackMode`.
pub fn router(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let page = |name: &str| ServeFile::new(public_dir.join(name));

    let mut public_routes = Router::new()
        .route_service("/", page("index.html"))
        .route("/signup", get_service(page("signup.html")).post(auth::signup))
        .route("/login", get_service(page("login.html")).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/confession", post(entries::submit_confession))
        .route("/confess", post(entries::submit_confession))
        .route("/anonymous", post(entries::submit_confession))
        .route("/dashboard.html", get(pages::dashboard_file))
        .route("/health", get(pages::health));

    let mut protected_routes = Router::new()
        .route_service("/dashboard", page("dashboard.html"))
        .route("/mood", post(entries::submit_mood))
        .route("/submit-mood", post(entries::submit_mood))
        .route("/journal", post(entries::submit_journal))
        .route("/my-moods", get(entries::my_moods))
        .route("/my-journals", get(entries::my_journals));

    match state.config.feedback_mode {
        FeedbackMode::Identified => {
            protected_routes = protected_routes.route("/feedback", post(entries::submit_feedback));
        }
        FeedbackMode::Open => {
            public_routes = public_routes.route("/feedback", post(entries::submit_open_feedback));
        }
    }

    let protected_routes =
        protected_routes.route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/admin", get(admin::admin_page))
        .route("/admin/data", get(admin::admin_data))
        .route("/admin/anonymous", get(admin::admin_anonymous))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .fallback_service(ServeDir::new(&public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
