use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use super::error::AuthError;
use crate::error::Error;
use crate::types::Principal;

/// Principal attached by the gate.
///
/// Use as an Axum extractor in handlers behind [`protect`](super::protect).
/// Returns `401 Unauthorized` if the gate let the request through anonymously.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(principal: Principal) -> impl IntoResponse {
///     format!("Hello, user {}", principal.subject_id)
/// }
///
/// // Optional-policy route: accessible to both authenticated and anonymous users
/// async fn evaluations(principal: Option<Principal>) -> impl IntoResponse {
///     match principal {
///         Some(p) => format!("Hello, {}", p.subject_id),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::Rejected(Error::MissingCredential))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned())
    }
}
