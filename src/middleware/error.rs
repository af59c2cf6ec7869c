use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::{ApiResult, codes};
use crate::error::Error;

/// Authentication errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The gate or refresh flow refused the credential.
    #[error("Not authenticated: {0}")]
    Rejected(Error),

    /// Revocation store write failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// Token signing, credential verification or another server-side step failed.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(ref reason) => {
                tracing::debug!(reason = %reason, "Request rejected");
                (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
            }
            Self::Store(_) | Self::Internal(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResult::failure(codes::INTERNAL_SERVER_ERROR, "Internal error"),
                )
                    .into_response()
            }
        }
    }
}

impl From<Error> for AuthError {
    fn from(e: Error) -> Self {
        match e {
            Error::Config(msg) => Self::Config(msg),
            Error::Signing(msg) => Self::Internal(msg),
            other => Self::Rejected(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_unauthorized() {
        for e in [Error::Revoked, Error::Expired, Error::MissingCredential] {
            let response = AuthError::from(e).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn store_unavailable_is_a_rejection() {
        let e = AuthError::from(Error::StoreUnavailable("down".into()));
        assert!(matches!(e, AuthError::Rejected(Error::StoreUnavailable(_))));
    }

    #[test]
    fn internal_failures_are_500() {
        let response = AuthError::from(Error::Signing("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = AuthError::Store("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
