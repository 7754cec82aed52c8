use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Every failure a handler can surface. Bodies are plain text so the
/// HTML forms can show them as-is.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or blank required field.
    #[error("{0}")]
    Validation(String),

    /// Unknown identity or wrong password. Never says which.
    #[error("Invalid credentials")]
    Authentication,

    /// Logged in, but the role is not enough.
    #[error("Access denied")]
    Authorization,

    /// Identity already taken.
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure. Details go to the log only.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Store(e) => {
                error!("Store error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Authentication.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Authorization.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn store_details_are_not_exposed() {
        use http_body_util::BodyExt;

        let resp = AppError::from(anyhow::anyhow!("secret path /var/db")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Internal server error");
    }
}
