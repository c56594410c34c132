//! JSON envelope shared by every endpoint.
//!
//! Successful and failed calls use the same shape:
//!
//! ```json
//! { "error": true, "response": "limit parameter must be >= 1, value 0 was given" }
//! ```
//!
//! [`ApiError`] maps each failure to its HTTP status:
//!
//! - `NotAnInteger`, `LimitTooLarge`, `InvalidRequest`: `400 Bad Request`
//! - `Timeout`, `ShuttingDown`: `503 Service Unavailable`
//! - `NotFound`: `404 Not Found`

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use core::time::Duration;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub error: bool,
    pub response: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn ok(response: T) -> Self {
        Self {
            error: false,
            response,
        }
    }
}

impl ApiResponse<String> {
    pub const fn failure(message: String) -> Self {
        Self {
            error: true,
            response: message,
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A numeric query parameter is missing or not an integer.
    #[error("{field} parameter must be an integer, value {value} was given")]
    NotAnInteger { field: &'static str, value: String },

    /// `limit` exceeds the configured maximum.
    #[error("limit parameter must be <= {max}, value {value} was given")]
    LimitTooLarge { max: i64, value: i64 },

    /// The request failed validation.
    #[error(transparent)]
    InvalidRequest(#[from] fizzbuzz::Error),

    /// Rendering did not finish within the configured deadline.
    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),

    /// The service stopped rendering before the sequence was complete.
    #[error("service is shutting down")]
    ShuttingDown,

    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotAnInteger { .. } | Self::LimitTooLarge { .. } | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Timeout(_) | Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, "{self}");
        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_error_flag_and_response() {
        let json = serde_json::to_value(ApiResponse::ok("1,2,A")).unwrap();
        assert_eq!(json, serde_json::json!({"error": false, "response": "1,2,A"}));

        let json = serde_json::to_value(ApiResponse::failure(String::from("boom"))).unwrap();
        assert_eq!(json, serde_json::json!({"error": true, "response": "boom"}));

        let json = serde_json::to_value(ApiResponse::<Option<u8>>::ok(None)).unwrap();
        assert_eq!(json, serde_json::json!({"error": false, "response": null}));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let invalid = fizzbuzz::Request::new(0, 1, 1, "", "").validate().unwrap_err();
        assert_eq!(ApiError::from(invalid).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::LimitTooLarge { max: 10, value: 11 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::ShuttingDown.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::NotFound(String::from("/nope")).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn messages_name_the_field_and_value() {
        let err = ApiError::NotAnInteger {
            field: "int1",
            value: String::from("abc"),
        };
        assert_eq!(
            err.to_string(),
            "int1 parameter must be an integer, value abc was given"
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_millis(250)).to_string(),
            "rendering timed out after 250ms"
        );
    }
}
