//! Standard response envelope helpers.
//!
//! Every body the API writes is an [`Envelope`]: `success`, then either `data` or
//! `error`, then a UTC `timestamp`.

use axum::{http::StatusCode, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Envelope<T = serde_json::Value> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
    timestamp: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl Envelope {
    /// Error shape written by the error middleware: code, message and optional details.
    pub fn failure(code: impl Into<String>, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(ErrorDetail {
                code: Some(code.into()),
                message: message.into(),
                details,
            }),
            timestamp: now_iso8601(),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:30:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn success_response<T: Serialize>(data: T) -> Envelope<T> {
    Envelope {
        success: true,
        data: Some(data),
        error: None,
        timestamp: now_iso8601(),
    }
}

pub fn error_response(message: impl Into<String>) -> Envelope {
    Envelope {
        success: false,
        data: None,
        error: Some(ErrorDetail {
            code: None,
            message: message.into(),
            details: None,
        }),
        timestamp: now_iso8601(),
    }
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(success_response(data)))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(success_response(data)))
}

/// 204 carries no body, so no envelope.
pub fn success_no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
