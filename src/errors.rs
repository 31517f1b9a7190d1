use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::form::ValidationError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Wrong credentials")]
    WrongCredentials,

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Token creation error")]
    TokenCreation,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "A user with this email already exists",
            ),
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
            AuthError::MissingCredentials => {
                (StatusCode::BAD_REQUEST, "Email and password are required")
            }
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate session",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired session"),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
            ),
        }
    }

    /// Text shown on the login and signup screens.
    pub fn notice(&self) -> &'static str {
        self.status_and_message().1
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Failure reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The store refused the row; carries its own message.
    #[error("{0}")]
    Validation(String),

    /// Refused by a row-level policy; carries the database message.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("store unavailable: {0}")]
    Transport(String),
}

impl StoreError {
    /// Message for a list, fetch or delete notice. Only rejection messages
    /// from the store are shown verbatim.
    pub fn notice(&self, fallback: &str) -> String {
        match self {
            StoreError::Validation(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Whatever message the store attached to the failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            StoreError::NotFound => None,
            StoreError::Validation(message)
            | StoreError::Unauthorized(message)
            | StoreError::Transport(message) => Some(message.as_str()).filter(|m| !m.is_empty()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) => {
                // insufficient_privilege, raised by row-level security policies
                if db.code().as_deref() == Some("42501") {
                    return StoreError::Unauthorized(db.message().to_string());
                }
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => StoreError::Validation(db.message().to_string()),
                    _ => StoreError::Transport(e.to_string()),
                }
            }
            _ => StoreError::Transport(e.to_string()),
        }
    }
}

/// Why a create or update did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaveError {
    /// Message for the re-rendered form. The store's own message wins when
    /// it has one.
    pub fn notice(&self, fallback: &str) -> String {
        match self {
            SaveError::Invalid(e) => e.to_string(),
            SaveError::Store(e) => e.message().unwrap_or(fallback).to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SaveError::Invalid(_) | SaveError::Store(StoreError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SaveError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            SaveError::Store(StoreError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            SaveError::Store(StoreError::Transport(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Error type of the JSON API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("deletion must be confirmed")]
    ConfirmationRequired,
}

impl From<SaveError> for ApiError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Invalid(e) => ApiError::Validation(e),
            SaveError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, "Not found".into()),
            ApiError::Store(StoreError::Validation(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::Store(StoreError::Unauthorized(_)) => {
                (StatusCode::FORBIDDEN, "Not authorized".into())
            }
            ApiError::Store(StoreError::Transport(detail)) => {
                tracing::error!(%detail, "Store call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
            ApiError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::ConfirmationRequired => (
                StatusCode::CONFLICT,
                "Deletion must be confirmed with ?confirm=true".into(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_rejections_are_shown_verbatim() {
        let e = StoreError::Validation("violates check constraint \"status\"".into());
        assert_eq!(
            e.notice("Failed to save appointment"),
            "violates check constraint \"status\""
        );
    }

    #[test]
    fn other_failures_fall_back_to_generic_text() {
        for e in [
            StoreError::NotFound,
            StoreError::Unauthorized("permission denied for table patients".into()),
            StoreError::Transport("connection reset".into()),
            StoreError::Validation(String::new()),
        ] {
            assert_eq!(e.notice("Failed to save patient"), "Failed to save patient");
        }
    }

    #[test]
    fn save_errors_keep_validation_text() {
        let e = SaveError::from(ValidationError::Required("city"));
        assert_eq!(e.notice("Failed to save doctor"), "city is required");
        assert_eq!(e.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let e = SaveError::from(StoreError::Transport("timeout".into()));
        assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn save_notices_surface_the_store_message() {
        let e = SaveError::from(StoreError::Transport(
            "pool timed out while waiting for an open connection".into(),
        ));
        assert_eq!(
            e.notice("Failed to save patient"),
            "pool timed out while waiting for an open connection"
        );

        let e = SaveError::from(StoreError::Unauthorized(
            "new row violates row-level security policy".into(),
        ));
        assert_eq!(
            e.notice("Failed to save patient"),
            "new row violates row-level security policy"
        );
        assert_eq!(e.status(), StatusCode::FORBIDDEN);

        for e in [StoreError::NotFound, StoreError::Transport(String::new())] {
            assert_eq!(
                SaveError::from(e).notice("Failed to save patient"),
                "Failed to save patient"
            );
        }
    }

    #[test]
    fn api_status_codes() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(StoreError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ValidationError::Required("city").into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(ApiError::ConfirmationRequired), StatusCode::CONFLICT);
        assert_eq!(
            status(AuthError::InvalidToken.into()),
            StatusCode::UNAUTHORIZED
        );
    }
}
