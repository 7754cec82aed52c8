pub mod admin;
pub mod auth;
pub mod config;
pub mod entries;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod session;

pub use auth::{AppState, AppStateInner};
pub use config::Config;
pub use error::AppError;
pub use routes::router;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use argon2::{Algorithm, Argon2, Params, Version};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use brightpath_db::Database;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::auth::{AppState, AppStateInner};
    use crate::config::Config;

    pub const SECRET: &str = "test-secret-0123456789";
    pub const ADMIN: &str = "admin@x.com";
    pub const ADMIN_PASSWORD: &str = "admin-pass";

    /// Minimum-cost Argon2id so tests do not spend seconds hashing.
    pub fn fast_hasher() -> Argon2<'static> {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    pub fn config(pairs: &[(&str, &str)]) -> Config {
        let mut map: HashMap<String, String> = HashMap::new();
        map.insert("BRIGHTPATH_SESSION_SECRET".into(), SECRET.into());
        map.insert("BRIGHTPATH_COOKIE_SECURE".into(), "false".into());
        map.insert("BRIGHTPATH_ADMIN_IDENTITIES".into(), ADMIN.into());
        map.insert("BRIGHTPATH_ADMIN_PASSWORD".into(), ADMIN_PASSWORD.into());
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    /// State as the server builds it, admin accounts already seeded.
    pub fn state(config: Config) -> AppState {
        let state = unseeded_state(config);
        crate::auth::bootstrap_admins(&state).unwrap();
        state
    }

    pub fn unseeded_state(config: Config) -> AppState {
        let db = Database::open_in_memory().unwrap();
        Arc::new(AppStateInner::with_hasher(db, config, fast_hasher()).unwrap())
    }

    pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
        app.clone().oneshot(req).await.unwrap()
    }

    pub fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn json(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn location(resp: &Response<Body>) -> Option<&str> {
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    /// `name=value` part of the first Set-Cookie header.
    pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
        resp.headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub async fn body_text(resp: Response<Body>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Signs up and logs in, returning the cookie header value.
    pub async fn login_as(app: &Router, identity: &str, password: &str) -> String {
        let body = format!("email={}&password={}", identity, password);
        let resp = send(app, form("/signup", &body, None)).await;
        assert!(resp.status().is_redirection(), "signup failed: {}", resp.status());
        let resp = send(app, form("/login", &body, None)).await;
        assert!(resp.status().is_redirection(), "login failed: {}", resp.status());
        session_cookie(&resp).expect("login sets a cookie")
    }

    /// Logs in as the seeded admin account.
    pub async fn login_admin(app: &Router) -> String {
        let body = format!("email={}&password={}", ADMIN, ADMIN_PASSWORD);
        let resp = send(app, form("/login", &body, None)).await;
        assert_eq!(location(&resp), Some("/admin"), "admin login failed: {}", resp.status());
        session_cookie(&resp).expect("login sets a cookie")
    }
}
