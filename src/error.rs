//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the crate-wide error type. On the WebSocket path
//! errors are only logged: the relay never answers a client frame with an
//! error. On the REST path each variant maps to a status code and a
//! structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: event name must not be empty"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Inbound frame is not a JSON `{event, data}` envelope.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Inbound frame names an event the relay does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// REST request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MalformedFrame(_) => 1002,
            Self::UnknownEvent(_) => 1003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MalformedFrame(_) | Self::UnknownEvent(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_request() {
        let err = RelayError::InvalidRequest("empty".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.to_string(), "invalid request: empty");
    }

    #[tokio::test]
    async fn into_response_carries_status_and_code() {
        let response = RelayError::UnknownEvent("teleport".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("unreadable body");
        };
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("body is not JSON");
        };
        assert_eq!(body["error"]["code"], 1003);
        assert_eq!(body["error"]["message"], "unknown event: teleport");
        assert!(body["error"].get("details").is_none());
    }
}
