//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"detail": "..."}`. Infrastructure
//! failures get a generic detail; the underlying cause is only logged.

use ag_directory::DirectoryError;
use ag_token::TokenError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Directory failure or rejection.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Token failure or rejection.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Missing or unusable credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Unexpected server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Directory(err) => match err {
                DirectoryError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                DirectoryError::InputValidation(_) => StatusCode::BAD_REQUEST,
                DirectoryError::GroupNotFound(_) => StatusCode::NOT_FOUND,
                DirectoryError::Bind(_)
                | DirectoryError::Operation(_)
                | DirectoryError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Token(err) => {
                if err.is_internal() {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::UNAUTHORIZED
                }
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the client-facing detail message.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Directory(err) => match err {
                DirectoryError::Bind(_) => "Directory service unavailable".to_string(),
                DirectoryError::Operation(_) => "Directory operation failed".to_string(),
                DirectoryError::GroupNotFound(_) => "Group not found".to_string(),
                DirectoryError::InputValidation(msg) => msg.clone(),
                DirectoryError::InvalidCredentials => err.to_string(),
                DirectoryError::Configuration(_) => GENERIC_DETAIL.to_string(),
            },
            Self::Token(err) => match err {
                TokenError::Expired => "Token has expired".to_string(),
                TokenError::Invalid(_) => "Invalid token".to_string(),
                TokenError::Revoked(_) => "Token has been revoked".to_string(),
                TokenError::RefreshExpired => "Refresh token has expired".to_string(),
                TokenError::RefreshInvalid(_) => "Invalid refresh token".to_string(),
                TokenError::RefreshRevoked => "Refresh token has been revoked".to_string(),
                TokenError::Signing(_) | TokenError::Configuration(_) => {
                    GENERIC_DETAIL.to_string()
                }
            },
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::Internal(_) => GENERIC_DETAIL.to_string(),
        }
    }
}

const GENERIC_DETAIL: &str = "An unexpected server error occurred.";

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            detail: self.detail(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_status_mapping() {
        let cases = [
            (ApiError::from(DirectoryError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError::from(DirectoryError::input("short")), StatusCode::BAD_REQUEST),
            (ApiError::from(DirectoryError::GroupNotFound("ops".into())), StatusCode::NOT_FOUND),
            (ApiError::from(DirectoryError::bind("refused")), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(DirectoryError::operation("rc=1")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn token_status_mapping() {
        assert_eq!(ApiError::from(TokenError::Expired).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(TokenError::RefreshRevoked).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::Signing("bad key".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn infrastructure_details_are_generic() {
        let err = ApiError::from(DirectoryError::bind("ldap://10.0.0.5 refused"));
        assert!(!err.detail().contains("10.0.0.5"));

        let err = ApiError::from(TokenError::invalid("InvalidSignature"));
        assert_eq!(err.detail(), "Invalid token");

        let err = ApiError::from(DirectoryError::config("bad url"));
        assert_eq!(err.detail(), GENERIC_DETAIL);
    }

    #[test]
    fn unauthorized_sets_challenge_header() {
        let response = ApiError::unauthorized("Not authenticated").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let response = ApiError::Forbidden("User not in group".into()).into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
