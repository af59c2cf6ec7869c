use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use super::error::AuthError;
use crate::session::IssuedSession;

/// Response header carrying the access token.
pub const ACCESS_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-jwt-token");
/// Response header carrying the refresh token.
pub const REFRESH_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-refresh-token");

fn header_value(token: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(token).map_err(|e| AuthError::Internal(format!("token header: {e}")))
}

/// Both credentials of a new session.
pub(super) fn session_headers(issued: &IssuedSession) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_TOKEN_HEADER, header_value(&issued.access_token)?);
    headers.insert(REFRESH_TOKEN_HEADER, header_value(&issued.refresh_token)?);
    Ok(headers)
}

/// A refreshed access token.
pub(super) fn access_header(access_token: &str) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_TOKEN_HEADER, header_value(access_token)?);
    Ok(headers)
}

/// Empty credential headers, telling the client to drop both tokens.
pub(super) fn cleared_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static(""));
    headers.insert(REFRESH_TOKEN_HEADER, HeaderValue::from_static(""));
    headers
}

/// Token from `Authorization: Bearer <token>`.
pub(super) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .filter(|token| !token.is_empty())
}

pub(super) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
