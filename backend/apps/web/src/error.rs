//! Snippet Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, domain::DomainError};
use thiserror::Error;

pub type SnippetResult<T> = Result<T, SnippetError>;

#[derive(Debug, Error)]
pub enum SnippetError {
    /// Expected storage outcome
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SnippetError {
    pub fn to_app_error(&self) -> AppError {
        match self {
            SnippetError::Domain(e) => AppError::from(*e),
            SnippetError::Database(_) => AppError::internal(),
        }
    }
}

impl IntoResponse for SnippetError {
    fn into_response(self) -> Response {
        match &self {
            SnippetError::Database(e) => tracing::error!(error = %e, "Snippet database error"),
            SnippetError::Domain(e) => tracing::debug!(error = %e, "Snippet lookup failed"),
        }
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_record_is_not_found() {
        let err = SnippetError::from(DomainError::NoRecord);
        assert_eq!(err.to_app_error().status_code(), 404);
    }

    #[test]
    fn test_database_error_is_generic() {
        let err = SnippetError::from(sqlx::Error::PoolTimedOut);
        let app = err.to_app_error();
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.message(), "Internal Server Error");
    }
}
