//! Keygate error types.
//!
//! Every authentication failure maps to a structured reason code plus an
//! HTTP status via the `IntoResponse` impl. Messages returned to clients are
//! intentionally generic where the cause is internal (e.g. a provider
//! outage); the actual cause is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Terminal outcome of a failed validation or authorization check.
///
/// Maps to HTTP status codes:
/// - All authentication failures: 401 Unauthorized
/// - `InsufficientScope`: 403 Forbidden
///
/// The four Authorization-header variants are deliberately distinct,
/// user-visible codes rather than one collapsed "bad header" error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingAuthorizationHeader,

    #[error("Authorization header must start with Bearer")]
    MissingBearerScheme,

    #[error("Token not found")]
    MissingToken,

    #[error("Authorization header must be a single Bearer token")]
    MalformedAuthorizationHeader,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    #[error("Insufficient scope: {0} required")]
    InsufficientScope(String),
}

impl AuthError {
    /// The key could not be resolved from the provider's key set.
    ///
    /// Shared by the miss and rotation-recovery paths so the caller-visible
    /// message stays identical regardless of which path rejected the token.
    pub(crate) fn unknown_key() -> Self {
        AuthError::InvalidHeader("unable to find appropriate key".to_string())
    }

    /// Stable machine-readable reason code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorizationHeader => "AUTHORIZATION_HEADER_MISSING",
            AuthError::MissingBearerScheme => "MISSING_BEARER_SCHEME",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::MalformedAuthorizationHeader => "MALFORMED_AUTHORIZATION_HEADER",
            AuthError::InvalidHeader(_) => "INVALID_HEADER",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::InvalidClaims(_) => "INVALID_CLAIMS",
            AuthError::InsufficientScope(_) => "INSUFFICIENT_SCOPE",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InsufficientScope(_) => 403,
            _ => 401,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InsufficientScope(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // RFC 6750 challenge on authentication failures
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer error=\"invalid_token\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
