//! Error types for the relay and their HTTP mapping.
//!
//! Only validation failures and internal faults ever reach a client. Device
//! and notification failures have their own types but are contained inside
//! `device` and `notify` and turn into log lines, never into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Faults raised by the in-memory stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

/// Request-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => {
                tracing::debug!(reason = %message, "Rejected request");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = ErrorBody {
            status: "error",
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_validation_returns_400_with_status_error() {
        // ---
        let response = ApiError::Validation("Invalid location data".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid location data");
    }

    #[tokio::test]
    async fn test_store_error_maps_to_500() {
        // ---
        let api_err: ApiError = StoreError::LockPoisoned("location").into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "location lock poisoned");
    }
}
