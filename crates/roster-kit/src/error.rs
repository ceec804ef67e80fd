use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::Environment;

/// Trait for converting application errors into JSON HTTP responses.
///
/// # Example
///
/// ```ignore
/// use roster_kit::HttpError;
/// use axum::http::StatusCode;
/// use axum::response::{IntoResponse, Response};
///
/// #[derive(Debug)]
/// enum AppError {
///     NotFound,
///     InvalidInput(String),
/// }
///
/// impl HttpError for AppError {
///     fn status_code(&self) -> StatusCode {
///         match self {
///             Self::NotFound => StatusCode::NOT_FOUND,
///             Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
///         }
///     }
///
///     fn message(&self) -> &str {
///         match self {
///             Self::NotFound => "Resource not found",
///             Self::InvalidInput(msg) => msg,
///         }
///     }
/// }
///
/// impl IntoResponse for AppError {
///     fn into_response(self) -> Response {
///         self.into_http_response()
///     }
/// }
/// ```
pub trait HttpError: std::fmt::Debug {
    fn status_code(&self) -> StatusCode;
    fn message(&self) -> &str;

    fn error_code(&self) -> String {
        status_to_error_code(self.status_code())
    }

    /// Structured detail attached to the response outside production.
    fn detail(&self) -> Option<Value> {
        None
    }

    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        self.into_http_response_for(Environment::Development)
    }

    /// Build the response, dropping `detail` when running in production.
    fn into_http_response_for(self, environment: Environment) -> Response
    where
        Self: Sized,
    {
        let detail = if environment.is_production() {
            None
        } else {
            self.detail()
        };
        let body = ErrorResponse {
            code: self.error_code(),
            message: self.message().to_string(),
            detail,
        };
        (self.status_code(), axum::Json(body)).into_response()
    }
}

/// Standard JSON error response format.
#[derive(Debug, Serialize, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// Create an error response from a status code.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status_to_error_code(status), message)
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Convert a status code to an error code string (e.g., "NOT_FOUND").
pub(crate) fn status_to_error_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("ERROR")
        .to_uppercase()
        .replace(' ', "_")
}
