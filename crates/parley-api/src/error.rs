//! API error types and JSON error response formatting.
//!
//! Every failure becomes `{"error": code, "message": text, "type": class}`,
//! where `type` is `validation`, `external_call`, or `internal` so callers
//! can decide whether a retry makes sense.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_chat::{ChatError, ErrorKind};
use serde::{Deserialize, Serialize};

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "upstream_timeout").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Failure class.
    #[serde(rename = "type")]
    pub kind: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - request failed validation.
    BadRequest(String),
    /// 404 Not Found - no such route or resource.
    NotFound(String),
    /// Body could not be parsed as a chat request; keeps axum's status.
    InvalidBody(StatusCode, String),
    /// 502 Bad Gateway - the completion service failed.
    Upstream(String),
    /// 504 Gateway Timeout - the completion service did not answer in time.
    UpstreamTimeout(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, ErrorKind) {
        match self {
            ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "bad_request", ErrorKind::Validation)
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", ErrorKind::Validation),
            ApiError::InvalidBody(status, _) => (*status, "invalid_body", ErrorKind::Validation),
            ApiError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_error", ErrorKind::ExternalCall)
            }
            ApiError::UpstreamTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout", ErrorKind::ExternalCall)
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", ErrorKind::Internal)
            }
        }
    }

    fn into_message(self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InvalidBody(_, msg)
            | ApiError::Upstream(msg)
            | ApiError::UpstreamTimeout(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, kind) = self.parts();
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                code = error_code,
                "Request failed: {:?}",
                self
            );
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message: self.into_message(),
            kind: kind.as_str().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Timeout(_) => ApiError::UpstreamTimeout(err.to_string()),
            ChatError::Internal(msg) => ApiError::Internal(msg),
            other => match other.kind() {
                ErrorKind::Validation => ApiError::BadRequest(other.to_string()),
                ErrorKind::ExternalCall => ApiError::Upstream(other.to_string()),
                ErrorKind::Internal => ApiError::Internal(other.to_string()),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.status(), rejection.body_text())
    }
}
