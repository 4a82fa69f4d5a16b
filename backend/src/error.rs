//! Unified error handling for the HTTP handlers.
//!
//! `ApiError` implements `IntoResponse`, so handlers use `?` and the client
//! gets a status code plus a JSON `ErrorResponse`. Provider details are
//! logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Login could not be completed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Session could not be serialized
    #[error("Session encoding error: {0}")]
    Session(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Auth(AuthError::StateMismatch) => (
                StatusCode::BAD_REQUEST,
                "Invalid authorization state".to_string(),
            ),
            ApiError::Auth(e) => {
                tracing::error!("Authentication error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication failed".to_string(),
                )
            }
            ApiError::Session(e) => {
                tracing::error!("Session encoding error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(ErrorResponse::new(error_message))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_state_mismatch_is_bad_request() {
        let response = ApiError::from(AuthError::StateMismatch).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Invalid authorization state"
        );
    }

    #[tokio::test]
    async fn test_provider_failure_hides_details() {
        let response = ApiError::from(AuthError::Provider {
            operation: "token exchange",
            status: 400,
            detail: r#"{"error":"invalid_grant"}"#.to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "Authentication failed"}));
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response = ApiError::bad_request("Missing Host header").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing Host header");
    }
}
