//! Typed errors and HTTP mapping.

use crate::constants::messages;
use crate::middleware::FailureReport;
use crate::service::{CredentialError, RequestError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// An error that may declare its own HTTP status and machine-readable code.
///
/// Undeclared values are filled in by [`FailureReport`]: 500 and
/// `INTERNAL_SERVER_ERROR`.
pub trait Failure: std::error::Error {
    fn status_code(&self) -> Option<StatusCode> {
        None
    }

    fn code(&self) -> Option<&str> {
        None
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Failure for ConfigError {}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found() -> Self {
        AppError::NotFound(messages::NOT_FOUND.into())
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Validation(e) => AppError::Validation(e),
            RequestError::Credential(e) => AppError::Credential(e),
        }
    }
}

impl Failure for AppError {
    fn status_code(&self) -> Option<StatusCode> {
        match self {
            AppError::BadRequest(_) => Some(StatusCode::BAD_REQUEST),
            AppError::Unauthorized(_) | AppError::Credential(_) => Some(StatusCode::UNAUTHORIZED),
            AppError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            AppError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            AppError::Conflict(_) => Some(StatusCode::CONFLICT),
            AppError::Validation(_) => Some(StatusCode::UNPROCESSABLE_ENTITY),
            AppError::Db(_) | AppError::Config(_) | AppError::Internal(_) => None,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            AppError::BadRequest(_) => Some("BAD_REQUEST"),
            AppError::Unauthorized(_) | AppError::Credential(_) => Some("UNAUTHORIZED"),
            AppError::Forbidden(_) => Some("FORBIDDEN"),
            AppError::NotFound(_) => Some("NOT_FOUND"),
            AppError::Conflict(_) => Some("CONFLICT"),
            AppError::Validation(_) => Some("VALIDATION_ERROR"),
            AppError::Db(_) | AppError::Config(_) | AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    /// Writes the production shape and attaches the report; the error middleware
    /// logs it and adds `details` in development.
    fn into_response(self) -> Response {
        FailureReport::from_failure(&self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::in_catalog;
    use crate::service::FieldIssue;

    #[test]
    fn declared_statuses_stay_in_catalog() {
        let errors = vec![
            AppError::BadRequest("x".into()),
            AppError::Unauthorized("x".into()),
            AppError::Forbidden("x".into()),
            AppError::not_found(),
            AppError::Conflict("x".into()),
            AppError::Validation(ValidationError::single(FieldIssue::new("name", "Required"))),
            AppError::Credential(CredentialError::Missing("X-User-Id")),
        ];
        for e in errors {
            let status = e.status_code().expect("declared status");
            assert!(in_catalog(status), "{status} not in catalog");
            assert!(e.code().is_some());
        }
    }

    #[test]
    fn internal_failures_declare_nothing() {
        let e = AppError::Db(sqlx::Error::PoolTimedOut);
        assert!(e.status_code().is_none());
        assert!(e.code().is_none());
        assert!(AppError::Config(ConfigError::Missing("DB_NAME")).status_code().is_none());
    }

    #[test]
    fn request_errors_keep_their_kind() {
        let err: AppError = RequestError::Credential(CredentialError::Missing("X-Account-Id")).into();
        assert!(matches!(err, AppError::Credential(_)));
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    }
}
