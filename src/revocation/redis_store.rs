use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::RevocationStore;
use crate::error::Error;
use crate::types::SessionId;

/// Key prefix for session tombstones.
pub const DEFAULT_KEY_PREFIX: &str = "users:ssid:";

/// Tombstones in Redis: `SET <prefix><session id> "" EX <ttl>` / `EXISTS`.
///
/// Holds a multiplexed, auto-reconnecting connection; clones share it.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisRevocationStore {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379/0`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unparseable URL and
    /// [`Error::StoreUnavailable`] if the initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client =
            redis::Client::open(url).map_err(|e| Error::Config(format!("REDIS_URL: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        tracing::info!("Connected to revocation store");
        Ok(Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.into(),
        })
    }

    /// Connects using environment variables.
    ///
    /// # Required env vars
    /// - `REDIS_URL`: Redis connection URL
    ///
    /// # Optional env vars
    /// - `REVOCATION_KEY_PREFIX`: Override the tombstone key prefix
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect), plus [`Error::Config`] if `REDIS_URL` is missing.
    pub async fn from_env() -> Result<Self, Error> {
        let url = std::env::var("REDIS_URL")
            .map_err(|_| Error::Config("REDIS_URL is required".into()))?;
        let store = Self::connect(&url).await?;
        Ok(match std::env::var("REVOCATION_KEY_PREFIX") {
            Ok(prefix) => store.with_key_prefix(prefix),
            Err(_) => store,
        })
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, session_id: &SessionId) -> String {
        tombstone_key(&self.key_prefix, session_id)
    }
}

fn tombstone_key(prefix: &str, session_id: &SessionId) -> String {
    format!("{prefix}{session_id}")
}

fn unavailable(e: redis::RedisError) -> Error {
    Error::StoreUnavailable(e.to_string())
}

impl RevocationStore for RedisRevocationStore {
    async fn mark_revoked(&self, session_id: &SessionId, ttl: Duration) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.key(session_id), "", seconds)
            .await
            .map_err(unavailable)
    }

    async fn is_revoked(&self, session_id: &SessionId) -> Result<bool, Error> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.key(session_id))
            .await
            .map_err(unavailable)
    }
}
