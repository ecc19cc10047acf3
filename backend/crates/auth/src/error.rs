//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Storage error codes are mapped here, once; the raw codes never cross
//! the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed validation; carries the first violated rule's message
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password, deliberately merged
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Account has 2FA active but no one-time passcode was supplied
    #[error("One-time passcode required")]
    OtpRequired,

    /// One-time passcode was supplied but is wrong or stale
    #[error("OTP is not valid or expired")]
    OtpInvalid,

    /// No valid session where one is required, or wrong current password
    #[error("Unauthorized")]
    Unauthorized,

    /// A session is present where the operation forbids one
    #[error("User already logged in")]
    AlreadyLoggedIn,

    /// The email is already registered (users.email unique constraint)
    #[error("User email must be unique")]
    DuplicateEmail,

    /// Reset token is unknown, consumed, or past its expiry instant
    #[error("Your token is invalid or has expired")]
    InvalidOrExpiredToken,

    /// Referenced user row is gone; should not normally reach the client
    #[error("User not found")]
    UserNotFound,

    /// Database error (generic fallback, details stay server-side)
    #[error("Database error occurred")]
    Database(#[source] sqlx::Error),

    /// Mail handoff failed
    #[error("Could not send the email")]
    Mail(#[source] platform::mail::MailError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::OtpRequired => StatusCode::from_u16(428).unwrap_or(StatusCode::UNAUTHORIZED), // Precondition Required
            AuthError::OtpInvalid => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::AlreadyLoggedIn => StatusCode::FORBIDDEN,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidOrExpiredToken => StatusCode::GONE,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Mail(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::OtpRequired
            | AuthError::OtpInvalid
            | AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::AlreadyLoggedIn => ErrorKind::Forbidden,
            AuthError::DuplicateEmail => ErrorKind::Conflict,
            AuthError::InvalidOrExpiredToken => ErrorKind::Gone,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Mail(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Mail(e) => {
                tracing::error!(error = %e, "Auth mail handoff error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::OtpInvalid => {
                tracing::warn!("Invalid one-time passcode");
            }
            AuthError::InvalidOrExpiredToken => {
                tracing::warn!("Invalid or expired reset token presented");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Central storage error mapping
///
/// `23505` on the users email constraint becomes [`AuthError::DuplicateEmail`];
/// everything else stays a generic database failure.
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return AuthError::DuplicateEmail;
            }
        }
        AuthError::Database(err)
    }
}

impl From<platform::mail::MailError> for AuthError {
    fn from(err: platform::mail::MailError) -> Self {
        AuthError::Mail(err)
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::OtpRequired.status_code().as_u16(), 428);
        assert_eq!(
            AuthError::DuplicateEmail.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::AlreadyLoggedIn.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InvalidOrExpiredToken.status_code(),
            StatusCode::GONE
        );
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = AuthError::Validation("passwords do not match".into());
        assert_eq!(err.to_string(), "passwords do not match");
    }

    #[test]
    fn test_duplicate_email_message() {
        assert_eq!(
            AuthError::DuplicateEmail.to_string(),
            "User email must be unique"
        );
    }
}
