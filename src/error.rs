use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use crate::auth::codec::TokenError;
use crate::auth::service::AuthError;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type shared by all service HTTP surfaces.
///
/// Carries enough structure for logging and for user-facing responses
/// without leaking internals.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication & Authorization =====
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    // ===== Validation =====
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Gateway =====
    #[error("upstream error: {0}")]
    Upstream(String),

    // ===== Internal =====
    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message, without sensitive details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg) => format!("Authentication failed: {msg}"),
            AppError::Forbidden(msg) => format!("Forbidden: {msg}"),
            AppError::Validation(msg) => format!("Validation error: {msg}"),
            AppError::NotFound(msg) => format!("Not found: {msg}"),
            AppError::Json(_) => "Invalid request body".to_string(),
            AppError::Upstream(_) => "Upstream service error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Stable code for programmatic error handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log this error with a level matching its severity.
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_code = %code, "server error occurred");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self, error_code = %code, "authentication failed");
        } else {
            tracing::debug!(error = %self, error_code = %code, "client error occurred");
        }
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::Upstream(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let body = json!({
            "error": self.user_message(),
            "error_code": self.error_code(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

// All token failures at a service boundary collapse to an unauthorized
// outcome; the specific reason stays in the logs.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::debug!(error = %err, "token error at request boundary");
        AppError::Auth("invalid or expired token".to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidRefreshToken => AppError::Auth("invalid refresh token".to_string()),
            AuthError::Token(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::auth("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::upstream("x").status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_refresh_failure_maps_to_unauthorized() {
        let err: AppError = AuthError::InvalidRefreshToken.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "AUTH_ERROR");
    }
}
