use serde::{Deserialize, Serialize};

/// Message returned by `GET /` once the session holds a signed-in user.
pub const LOGGED_IN_MESSAGE: &str = "You are logged in";

/// Body returned by `GET /id_token` when the session has no token yet.
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated. Please visit '/' to log in first.";

// ============================================================================
// Session API Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginStatusResponse {
    pub message: String,
    pub email: Option<String>,
}

impl LoginStatusResponse {
    pub fn logged_in(email: Option<String>) -> Self {
        Self {
            message: LOGGED_IN_MESSAGE.to_string(),
            email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenResponse {
    pub id_token: String,
    pub client_id: String,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// The body `GET /id_token` returns before the user has signed in.
    pub fn not_authenticated() -> Self {
        Self::new(NOT_AUTHENTICATED_MESSAGE)
    }
}
