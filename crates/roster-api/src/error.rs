use axum::response::{IntoResponse, Response};
use roster_auth::{AuthError, TokenError};
use roster_kit::{HttpError, StatusCode};

use crate::users::StoreError;

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input or a rejected business rule; the message is shown to
    /// the client as is.
    BadRequest(String),
    NotFound(String),
    /// The caller is authenticated but may not act on this resource.
    Forbidden,
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn user_not_found() -> Self {
        Self::NotFound("User not found!".to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => f.write_str(msg),
            Self::Forbidden => f.write_str("forbidden"),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl HttpError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg,
            Self::Forbidden => "User has no permission to access this resource.",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Same surface as a role gate rejection.
            Self::Forbidden => AuthError::permission_denied().into_response(),
            Self::Internal(ref cause) => {
                tracing::error!(error = %cause, "request failed");
                self.into_http_response()
            }
            _ => self.into_http_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::user_not_found(),
            StoreError::Duplicate(email) => {
                Self::BadRequest(format!("Account: {} is already taken.", email))
            }
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Internal(err.to_string())
    }
}
