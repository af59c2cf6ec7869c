use std::time::Duration;

use crate::error::Error;
use crate::revocation::{FailMode, RevocationPolicy, RevocationStore};
use crate::token::{AccessClaim, CLOCK_SKEW_LEEWAY_SECS, Claims, RefreshClaim, TokenCodec};
use crate::types::{Principal, SessionId, SubjectId};

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lifetimes and revocation behaviour of issued sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub revocation: RevocationPolicy,
    /// Reject access tokens presented with a different `User-Agent` than at issuance.
    pub check_user_agent: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            revocation: RevocationPolicy::default(),
            check_user_agent: false,
        }
    }
}

impl SessionSettings {
    /// Tombstone lifetime: outlives every token bound to the session.
    #[must_use]
    pub fn tombstone_ttl(&self) -> Duration {
        self.refresh_ttl
            .max(self.access_ttl)
            .saturating_add(Duration::from_secs(CLOCK_SKEW_LEEWAY_SECS))
    }
}

/// Credentials of a freshly issued session, to be delivered to the caller.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: SessionId,
    pub access_token: String,
    pub refresh_token: String,
}

/// The only component that mints or kills sessions.
pub struct SessionManager<S> {
    codec: TokenCodec,
    store: S,
    settings: SessionSettings,
}

impl<S: RevocationStore> SessionManager<S> {
    #[must_use]
    pub fn new(codec: TokenCodec, store: S, settings: SessionSettings) -> Self {
        Self {
            codec,
            store,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Starts a new session for `subject_id` and signs its token pair.
    ///
    /// No store I/O: a session exists only through its tokens until revoked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if token encoding fails.
    pub fn issue_session(
        &self,
        subject_id: SubjectId,
        user_agent: &str,
    ) -> Result<IssuedSession, Error> {
        let session_id = SessionId::generate();

        let refresh = RefreshClaim::new(
            subject_id.clone(),
            session_id.clone(),
            user_agent,
            self.settings.refresh_ttl,
        );
        let access = AccessClaim::new(
            subject_id,
            session_id.clone(),
            user_agent,
            self.settings.access_ttl,
        );

        let refresh_token = self.codec.issue(&Claims::Refresh(refresh))?;
        let access_token = self.codec.issue(&Claims::Access(access))?;

        tracing::info!(session_id = %session_id, "Session issued");
        Ok(IssuedSession {
            session_id,
            access_token,
            refresh_token,
        })
    }

    /// Writes the session's tombstone. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the write fails after one retry.
    pub async fn revoke_session(&self, session_id: &SessionId) -> Result<(), Error> {
        self.settings
            .revocation
            .mark_revoked(&self.store, session_id, self.settings.tombstone_ttl())
            .await?;
        tracing::info!(session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Exchanges a refresh token for a new access token in the same session.
    ///
    /// # Errors
    ///
    /// Token errors from [`TokenCodec::verify_refresh`], [`Error::Revoked`], or
    /// [`Error::StoreUnavailable`] when failing closed.
    pub async fn refresh_access(&self, refresh_token: &str) -> Result<String, Error> {
        let refresh = self.codec.verify_refresh(refresh_token)?;
        self.ensure_not_revoked(&refresh.session_id).await?;

        let access = AccessClaim::new(
            refresh.subject_id,
            refresh.session_id.clone(),
            refresh.user_agent,
            self.settings.access_ttl,
        );
        let token = self.codec.issue(&Claims::Access(access))?;

        tracing::info!(session_id = %refresh.session_id, "Access token refreshed");
        Ok(token)
    }

    /// Resolves an access token to its principal.
    ///
    /// `user_agent` is the request's `User-Agent`; it is only compared when
    /// [`SessionSettings::check_user_agent`] is set.
    ///
    /// # Errors
    ///
    /// Token errors from [`TokenCodec::verify_access`], [`Error::UserAgentMismatch`],
    /// [`Error::Revoked`], or [`Error::StoreUnavailable`] when failing closed.
    pub async fn authenticate(
        &self,
        access_token: &str,
        user_agent: Option<&str>,
    ) -> Result<Principal, Error> {
        let claim = self.codec.verify_access(access_token)?;

        if self.settings.check_user_agent && claim.user_agent != user_agent.unwrap_or_default() {
            tracing::warn!(session_id = %claim.session_id, "User-Agent mismatch");
            return Err(Error::UserAgentMismatch);
        }

        self.ensure_not_revoked(&claim.session_id).await?;

        Ok(Principal {
            subject_id: claim.subject_id,
            session_id: claim.session_id,
            user_agent: claim.user_agent,
        })
    }

    async fn ensure_not_revoked(&self, session_id: &SessionId) -> Result<(), Error> {
        let policy = self.settings.revocation;
        match policy.is_revoked(&self.store, session_id).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(Error::Revoked),
            Err(e) => match policy.fail_mode {
                FailMode::Closed => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Revocation store unavailable, failing closed"
                    );
                    Err(e)
                }
                FailMode::Open => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Revocation store unavailable, failing open"
                    );
                    Ok(())
                }
            },
        }
    }
}
