use std::sync::Arc;

use axum::Router;
use axum::extract::{OriginalUri, Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};

use super::config::GateConfig;
use super::error::AuthError;
use super::headers;
use super::policy::{AccessPolicy, PolicyTable};
use crate::error::Error;
use crate::revocation::RevocationStore;
use crate::session::SessionManager;
use crate::token::TokenCodec;
use crate::types::Principal;

/// Outcome of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized(Principal),
    AllowedAnonymous,
    Rejected(Error),
}

/// Request-time authorization: token checks, revocation lookup, route policy.
pub struct AccessGate<R> {
    sessions: SessionManager<R>,
    policies: PolicyTable,
    auth_path: String,
}

impl<R: RevocationStore> AccessGate<R> {
    /// Builds the gate. Login and refresh paths under the configured auth path
    /// are registered as [`AccessPolicy::Public`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] for invalid signing keys or an auth path
    /// that is not a plain route.
    pub fn new(config: GateConfig, store: R) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(&config.access_key, &config.refresh_key)?;
        let auth_path = config.auth_path;
        let policies = config
            .policies
            .with_route(&format!("{auth_path}/login"), AccessPolicy::Public)?
            .with_route(&format!("{auth_path}/refresh_token"), AccessPolicy::Public)?;

        Ok(Self {
            sessions: SessionManager::new(codec, store, config.session),
            policies,
            auth_path,
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager<R> {
        &self.sessions
    }

    #[must_use]
    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }

    /// Decides whether a request for `path` bearing `token` may proceed.
    pub async fn authorize(
        &self,
        path: &str,
        token: Option<&str>,
        user_agent: Option<&str>,
    ) -> Decision {
        let policy = self.policies.classify(path);
        if policy == AccessPolicy::Public {
            return Decision::AllowedAnonymous;
        }

        let Some(token) = token else {
            return match policy {
                AccessPolicy::Required => Decision::Rejected(Error::MissingCredential),
                _ => Decision::AllowedAnonymous,
            };
        };

        match self.sessions.authenticate(token, user_agent).await {
            Ok(principal) => Decision::Authorized(principal),
            // Never honored, whatever the route's policy.
            Err(e @ (Error::Revoked | Error::StoreUnavailable(_))) => Decision::Rejected(e),
            Err(e) if policy == AccessPolicy::Optional => {
                tracing::debug!(path, reason = %e, "Invalid credential on optional route, serving as guest");
                Decision::AllowedAnonymous
            }
            Err(e) => Decision::Rejected(e),
        }
    }
}

/// Axum middleware running [`AccessGate::authorize`] on every request.
///
/// Authorized requests get the [`Principal`] in their extensions.
pub async fn require_session<R: RevocationStore>(
    State(gate): State<Arc<AccessGate<R>>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Full path, also when mounted under `Router::nest`.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |uri| uri.0.path())
        .to_owned();
    let token = headers::bearer_token(request.headers());
    let user_agent = headers::user_agent(request.headers());

    match gate
        .authorize(&path, token.as_deref(), user_agent.as_deref())
        .await
    {
        Decision::Authorized(principal) => {
            tracing::debug!(path = %path, session_id = %principal.session_id, "Request authorized");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Decision::AllowedAnonymous => next.run(request).await,
        Decision::Rejected(reason) => {
            tracing::debug!(path = %path, reason = %reason, "Request rejected by gate");
            AuthError::Rejected(reason).into_response()
        }
    }
}

/// Puts every route of `router` behind the gate.
///
/// ```rust,ignore
/// let gate = Arc::new(AccessGate::new(GateConfig::from_env()?, store)?);
/// let api = protect(
///     Router::new().route("/users/profile", get(profile)),
///     gate.clone(),
/// );
/// let app = api.merge(auth_routes(gate, verifier));
/// ```
pub fn protect<R, S>(router: Router<S>, gate: Arc<AccessGate<R>>) -> Router<S>
where
    R: RevocationStore,
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(gate, require_session::<R>))
}
