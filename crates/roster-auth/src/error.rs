use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Boxed error returned by pluggable collaborators (secret resolvers,
/// revocation checkers, token extractors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What went wrong while authenticating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// No token was presented and credentials are required.
    CredentialsRequired,
    /// `Authorization` header is not `<scheme> <credentials>`.
    CredentialsBadFormat,
    /// `Authorization` scheme is not `Bearer`.
    CredentialsBadScheme,
    /// Token is malformed, expired, badly signed or its key is unknown.
    InvalidToken,
    /// Token was revoked before its natural expiry.
    RevokedToken,
    /// Token is valid but its role is not accepted here.
    PermissionDenied,
    /// A collaborator (token extractor, revocation store) failed.
    CheckFailed,
}

impl AuthErrorKind {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialsRequired => "credentials_required",
            Self::CredentialsBadFormat => "credentials_bad_format",
            Self::CredentialsBadScheme => "credentials_bad_scheme",
            Self::InvalidToken => "invalid_token",
            Self::RevokedToken => "revoked_token",
            Self::PermissionDenied => "permission_denied",
            Self::CheckFailed => "auth_check_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::CheckFailed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Error family name as seen by API clients.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "ForbiddenError",
            Self::CheckFailed => "AuthError",
            _ => "UnauthorizedError",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            Self::CredentialsRequired => "No authorization token was found",
            Self::CredentialsBadFormat | Self::CredentialsBadScheme => {
                "Format is Authorization: Bearer [token]"
            }
            Self::InvalidToken => "The token is invalid or expired",
            Self::RevokedToken => "The token has been revoked.",
            Self::PermissionDenied => "User has no permission to access this resource.",
            Self::CheckFailed => "Authentication could not be completed",
        }
    }
}

/// A rejected authentication attempt.
///
/// `inner` carries the underlying cause (a JWT library error, a store
/// failure). It is part of the response body only outside production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
    inner: Option<String>,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            inner: None,
        }
    }

    pub fn credentials_required() -> Self {
        Self::new(AuthErrorKind::CredentialsRequired)
    }

    pub fn credentials_bad_format() -> Self {
        Self::new(AuthErrorKind::CredentialsBadFormat)
    }

    pub fn credentials_bad_scheme() -> Self {
        Self::new(AuthErrorKind::CredentialsBadScheme)
    }

    pub fn invalid_token(cause: impl fmt::Display) -> Self {
        Self::new(AuthErrorKind::InvalidToken).with_inner(cause)
    }

    pub fn revoked() -> Self {
        Self::new(AuthErrorKind::RevokedToken)
    }

    pub fn permission_denied() -> Self {
        Self::new(AuthErrorKind::PermissionDenied)
    }

    pub fn check_failed(cause: impl fmt::Display) -> Self {
        Self::new(AuthErrorKind::CheckFailed).with_inner(cause)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_inner(mut self, cause: impl fmt::Display) -> Self {
        self.inner = Some(cause.to_string());
        self
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn inner(&self) -> Option<&str> {
        self.inner.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Drop internal details before the error leaves the process.
    pub fn redacted(mut self) -> Self {
        self.inner = None;
        self
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind.name(), self.kind.code(), self.message)?;
        if let Some(inner) = &self.inner {
            write!(f, ": {}", inner)?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
struct AuthErrorBody<'a> {
    name: &'static str,
    code: &'static str,
    status: u16,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    inner: Option<&'a str>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = AuthErrorBody {
            name: self.kind.name(),
            code: self.kind.code(),
            status: status.as_u16(),
            message: &self.message,
            inner: self.inner.as_deref(),
        };
        (status, axum::Json(body)).into_response()
    }
}
