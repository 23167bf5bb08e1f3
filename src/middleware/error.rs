//! Last-resort failure interception: one uniform error envelope per failing request.

use crate::config::RuntimeMode;
use crate::constants::{in_catalog, messages, DEFAULT_ERROR_CODE};
use crate::error::{AppError, Failure};
use crate::response::Envelope;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use std::fmt::Write;

/// Upper bound on a framework rejection body read back into the envelope message.
const REJECTION_TEXT_LIMIT: usize = 8 * 1024;

/// Resolved view of a failure, carried in response extensions until the
/// middleware renders it.
#[derive(Clone, Debug)]
pub struct FailureReport {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    /// Debug rendering plus source chain. Only ever written in development.
    pub trace: String,
}

impl FailureReport {
    pub fn from_failure<F: Failure>(failure: &F) -> Self {
        let message = failure.to_string();
        let message = if message.is_empty() {
            messages::UNEXPECTED.to_string()
        } else {
            message
        };
        FailureReport {
            status: failure.status_code().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: failure.code().unwrap_or(DEFAULT_ERROR_CODE).to_string(),
            message,
            trace: trace_of(failure),
        }
    }

    pub fn render(&self, mode: RuntimeMode) -> (StatusCode, Envelope) {
        let details = match mode {
            RuntimeMode::Development => Some(serde_json::Value::String(self.trace.clone())),
            RuntimeMode::Production => None,
        };
        (
            self.status,
            Envelope::failure(self.code.clone(), self.message.clone(), details),
        )
    }
}

impl IntoResponse for FailureReport {
    fn into_response(self) -> Response {
        let (status, body) = self.render(RuntimeMode::Production);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

fn trace_of(failure: &dyn std::error::Error) -> String {
    let mut out = format!("{:?}", failure);
    let mut source = failure.source();
    while let Some(cause) = source {
        let _ = write!(out, "\ncaused by: {}", cause);
        source = cause.source();
    }
    out
}

/// Logs any failed response and rewrites its body for the configured mode.
pub async fn error_middleware(State(mode): State<RuntimeMode>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    let attached = response.extensions().get::<FailureReport>().cloned();
    let report = match attached {
        Some(report) => report,
        None if needs_envelope(response.status()) => framework_report(response).await,
        None => return response,
    };
    tracing::error!(
        %method,
        %uri,
        status = report.status.as_u16(),
        code = %report.code,
        error = %report.message,
        trace = %report.trace,
        "request failed"
    );
    let (status, body) = report.render(mode);
    (status, Json(body)).into_response()
}

fn needs_envelope(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error() || !in_catalog(status)
}

/// Responses written by axum itself (method mismatch, built-in extractor
/// rejections) carry plain text and statuses outside the catalog.
async fn framework_report(response: Response) -> FailureReport {
    let status = response.status();
    let text = match axum::body::to_bytes(response.into_body(), REJECTION_TEXT_LIMIT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        text
    };
    FailureReport::from_failure(&framework_failure(status, message))
}

/// Maps a framework status onto the catalog.
fn framework_failure(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => AppError::NotFound(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        s if s.is_client_error() => AppError::BadRequest(message),
        _ => AppError::Internal(message),
    }
}

/// Panic handler for `CatchPanicLayer`; the report flows through [`error_middleware`].
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    FailureReport {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: DEFAULT_ERROR_CODE.to_string(),
        message: messages::INTERNAL_ERROR.to_string(),
        trace: format!("panic: {}", detail),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct Undeclared;

    impl Failure for Undeclared {}

    #[derive(Debug, thiserror::Error)]
    #[error("")]
    struct Silent;

    impl Failure for Silent {}

    #[test]
    fn undeclared_failure_defaults_to_500() {
        let report = FailureReport::from_failure(&Undeclared);
        let (status, body) = report.render(RuntimeMode::Production);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let v = serde_json::to_value(body).unwrap();
        assert_eq!(v["error"]["code"], json!("INTERNAL_SERVER_ERROR"));
        assert_eq!(v["error"]["message"], json!("disk on fire"));
    }

    #[test]
    fn declared_status_and_code_are_kept() {
        let report = FailureReport::from_failure(&AppError::NotFound("no such thing".into()));
        let (status, body) = report.render(RuntimeMode::Production);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(serde_json::to_value(body).unwrap()["error"]["code"], json!("NOT_FOUND"));
    }

    #[test]
    fn details_only_in_development() {
        let report = FailureReport::from_failure(&Undeclared);
        let dev = serde_json::to_value(report.render(RuntimeMode::Development).1).unwrap();
        let prod = serde_json::to_value(report.render(RuntimeMode::Production).1).unwrap();
        assert!(dev["error"]["details"].as_str().unwrap().contains("Undeclared"));
        assert!(prod["error"].get("details").is_none());
        assert_eq!(dev["error"]["message"], prod["error"]["message"]);
    }

    #[test]
    fn empty_message_falls_back() {
        let report = FailureReport::from_failure(&Silent);
        assert_eq!(report.message, messages::UNEXPECTED);
    }

    #[test]
    fn trace_walks_source_chain() {
        let err = AppError::Db(sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "socket closed")));
        let report = FailureReport::from_failure(&err);
        assert!(report.trace.contains("caused by"));
        assert!(report.trace.contains("socket closed"));
    }

    #[test]
    fn framework_statuses_map_into_catalog() {
        let cases = [
            (StatusCode::METHOD_NOT_ALLOWED, StatusCode::NOT_FOUND),
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, StatusCode::BAD_REQUEST),
            (StatusCode::PAYLOAD_TOO_LARGE, StatusCode::BAD_REQUEST),
            (StatusCode::UNPROCESSABLE_ENTITY, StatusCode::BAD_REQUEST),
            (StatusCode::FORBIDDEN, StatusCode::FORBIDDEN),
            (StatusCode::SERVICE_UNAVAILABLE, StatusCode::INTERNAL_SERVER_ERROR),
            (StatusCode::PERMANENT_REDIRECT, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (from, to) in cases {
            let report = FailureReport::from_failure(&framework_failure(from, "x".into()));
            assert_eq!(report.status, to, "{from}");
            assert!(in_catalog(report.status));
        }
    }

    #[test]
    fn catalog_successes_pass_through() {
        assert!(!needs_envelope(StatusCode::OK));
        assert!(!needs_envelope(StatusCode::NO_CONTENT));
        assert!(needs_envelope(StatusCode::METHOD_NOT_ALLOWED));
        assert!(needs_envelope(StatusCode::ACCEPTED));
    }

    #[tokio::test]
    async fn empty_rejection_uses_reason_phrase() {
        let response = StatusCode::METHOD_NOT_ALLOWED.into_response();
        let report = framework_report(response).await;
        assert_eq!(report.status, StatusCode::NOT_FOUND);
        assert_eq!(report.code, "NOT_FOUND");
        assert_eq!(report.message, "Method Not Allowed");
    }

    #[test]
    fn panic_payload_becomes_report() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<FailureReport>().unwrap();
        assert_eq!(report.code, "INTERNAL_SERVER_ERROR");
        assert!(report.trace.contains("boom"));
    }
}
