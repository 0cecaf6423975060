//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! - `Domain` carries the closed storage taxonomy and is handled by the
//!   immediate caller.
//! - `CsrfMismatch` and `Unauthenticated` are produced and answered inside
//!   the request pipeline.
//! - `Database`, `PasswordHash` and `Internal` are faults: logged in full,
//!   answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, domain::DomainError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Expected storage outcome
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Submitted CSRF token absent or not equal to the session's token
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Protected route reached without an authenticated session
    #[error("Authentication required")]
    Unauthenticated,

    /// Password hashing failed
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Domain(e) => e.kind(),
            AuthError::CsrfMismatch => ErrorKind::BadRequest,
            AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::PasswordHash(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// True for unexpected failures (never shown to the client in detail)
    pub fn is_fault(&self) -> bool {
        self.kind().is_server_error()
    }

    /// Convert to AppError
    ///
    /// Faults collapse to the generic server error message.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Domain(e) => AppError::from(*e),
            _ if self.is_fault() => AppError::internal(),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password hashing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Domain(DomainError::InvalidCredentials) => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::CsrfMismatch => {
                tracing::warn!("CSRF token mismatch");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::from(DomainError::NoRecord).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AuthError::CsrfMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_fault_detail_is_not_exposed() {
        let err = AuthError::Internal("pool exhausted on db-primary-7".to_string());
        assert!(err.is_fault());
        let app_err = err.to_app_error();
        assert_eq!(app_err.message(), "Internal Server Error");
    }

    #[test]
    fn test_domain_errors_are_not_faults() {
        for e in [
            DomainError::NoRecord,
            DomainError::InvalidCredentials,
            DomainError::DuplicateEmail,
        ] {
            assert!(!AuthError::from(e).is_fault());
        }
    }
}
