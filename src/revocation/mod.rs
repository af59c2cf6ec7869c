//! Session revocation markers in a shared TTL store.
//!
//! A session is revoked iff a tombstone key exists for its id. The store
//! never holds session content, only those markers.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

pub use memory::MemoryRevocationStore;
#[cfg(feature = "redis")]
pub use redis_store::{DEFAULT_KEY_PREFIX, RedisRevocationStore};

use crate::error::Error;
use crate::types::SessionId;

/// How the gate resolves a decision when the store cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Treat the session as revoked.
    Closed,
    /// Treat the session as not revoked; signature and expiry still apply.
    Open,
}

pub const DEFAULT_FAIL_MODE: FailMode = FailMode::Closed;

/// Upper bound for a single store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(300);

impl FromStr for FailMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            other => Err(Error::Config(format!(
                "unknown fail mode '{other}', expected 'closed' or 'open'"
            ))),
        }
    }
}

/// Tombstone storage.
///
/// Implementations report every transport or server failure as
/// [`Error::StoreUnavailable`]; `Ok(false)` only means the key is absent.
///
/// # Example
///
/// ```rust,ignore
/// impl RevocationStore for MyKv {
///     async fn mark_revoked(&self, session_id: &SessionId, ttl: Duration) -> Result<(), Error> {
///         self.kv.set_with_ttl(session_id.as_str(), b"", ttl).await
///             .map_err(|e| Error::StoreUnavailable(e.to_string()))
///     }
///
///     async fn is_revoked(&self, session_id: &SessionId) -> Result<bool, Error> {
///         self.kv.exists(session_id.as_str()).await
///             .map_err(|e| Error::StoreUnavailable(e.to_string()))
///     }
/// }
/// ```
pub trait RevocationStore: Send + Sync + 'static {
    /// Writes a tombstone that lives for `ttl`. Idempotent.
    fn mark_revoked(
        &self,
        session_id: &SessionId,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Existence check for the session's tombstone.
    fn is_revoked(&self, session_id: &SessionId)
    -> impl Future<Output = Result<bool, Error>> + Send;
}

/// Timeout and fail-mode settings applied around every store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationPolicy {
    pub fail_mode: FailMode,
    pub timeout: Duration,
}

impl Default for RevocationPolicy {
    fn default() -> Self {
        Self {
            fail_mode: DEFAULT_FAIL_MODE,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl RevocationPolicy {
    /// Existence check bounded by the timeout, with one retry on failure.
    pub(crate) async fn is_revoked<S: RevocationStore>(
        &self,
        store: &S,
        session_id: &SessionId,
    ) -> Result<bool, Error> {
        self.with_retry("is_revoked", session_id, || store.is_revoked(session_id))
            .await
    }

    /// Tombstone write bounded by the timeout, with one retry on failure.
    pub(crate) async fn mark_revoked<S: RevocationStore>(
        &self,
        store: &S,
        session_id: &SessionId,
        ttl: Duration,
    ) -> Result<(), Error> {
        self.with_retry("mark_revoked", session_id, || {
            store.mark_revoked(session_id, ttl)
        })
        .await
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        session_id: &SessionId,
        mut call: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.bounded(call()).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    operation,
                    session_id = %session_id,
                    error = %e,
                    "Revocation store call failed, retrying once"
                );
                self.bounded(call()).await
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Error::StoreUnavailable(reason))) => Err(Error::StoreUnavailable(reason)),
            Ok(Err(other)) => Err(Error::StoreUnavailable(other.to_string())),
            Err(_) => Err(Error::StoreUnavailable(format!(
                "no answer within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
