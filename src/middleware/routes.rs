use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware::{from_fn_with_state, map_response};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::AuthError;
use super::gate::{AccessGate, require_session};
use super::headers;
use super::state::AuthState;
use super::traits::CredentialVerifier;
use super::types::{ApiResult, LoginRequest, codes};
use crate::error::Error;
use crate::revocation::RevocationStore;
use crate::types::Principal;

/// Create the credential router: login, logout and refresh under the gate's auth path.
///
/// Logout runs behind [`require_session`]; login and refresh are public.
/// Every logout response clears both credential headers, including a rejection
/// by the gate itself.
pub fn auth_routes<R, V>(gate: Arc<AccessGate<R>>, verifier: V) -> Router
where
    R: RevocationStore,
    V: CredentialVerifier,
{
    let auth_path = gate.auth_path().to_owned();

    let state = AuthState {
        gate: gate.clone(),
        verifier: Arc::new(verifier),
    };

    let logout_route = post(logout::<R, V>)
        .route_layer(from_fn_with_state(gate, require_session::<R>))
        .layer(map_response(clear_credentials));

    Router::new()
        .route(&format!("{auth_path}/logout"), logout_route)
        .route(&format!("{auth_path}/login"), post(login::<R, V>))
        .route(
            &format!("{auth_path}/refresh_token"),
            get(refresh_token::<R, V>),
        )
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<R: RevocationStore, V: CredentialVerifier>(
    State(state): State<AuthState<R, V>>,
    request_headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let login = match payload {
        Ok(Json(login))
            if !login.student_id.trim().is_empty() && !login.password.is_empty() =>
        {
            login
        }
        Ok(_) => {
            return Ok(
                ApiResult::failure(codes::USER_INVALID_INPUT, "Missing student id or password")
                    .into_response(),
            );
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable login body");
            return Ok(
                ApiResult::failure(codes::USER_INVALID_INPUT, "Invalid login request")
                    .into_response(),
            );
        }
    };

    let subject_id = state
        .verifier
        .verify(&login)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Credential verification failed");
            AuthError::Internal(format!("credential verification: {e}"))
        })?;

    let Some(subject_id) = subject_id else {
        tracing::info!(student_id = %login.student_id, "Login rejected");
        return Ok(ApiResult::failure(
            codes::USER_INVALID_CREDENTIALS,
            "Invalid student id or password",
        )
        .into_response());
    };

    let user_agent = headers::user_agent(&request_headers).unwrap_or_default();
    let issued = state.gate.sessions().issue_session(subject_id, &user_agent)?;
    let response_headers = headers::session_headers(&issued)?;

    tracing::info!(session_id = %issued.session_id, "Login successful");

    Ok((response_headers, ApiResult::success()).into_response())
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh_token<R: RevocationStore, V: CredentialVerifier>(
    State(state): State<AuthState<R, V>>,
    request_headers: HeaderMap,
) -> Result<(HeaderMap, ApiResult), AuthError> {
    let token = headers::bearer_token(&request_headers)
        .ok_or(AuthError::Rejected(Error::MissingCredential))?;

    let access_token = state.gate.sessions().refresh_access(&token).await?;

    Ok((headers::access_header(&access_token)?, ApiResult::success()))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<R: RevocationStore, V: CredentialVerifier>(
    State(state): State<AuthState<R, V>>,
    principal: Principal,
) -> Result<ApiResult, AuthError> {
    state
        .gate
        .sessions()
        .revoke_session(&principal.session_id)
        .await
        .map(|()| ApiResult::success())
        .map_err(|e| {
            tracing::warn!(session_id = %principal.session_id, error = %e, "Tombstone write failed during logout");
            AuthError::Store(e.to_string())
        })
}

async fn clear_credentials(mut response: Response) -> Response {
    response.headers_mut().extend(headers::cleared_headers());
    response
}
