use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::RevocationStore;
use crate::error::Error;
use crate::types::SessionId;

const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Process-local tombstone store.
///
/// Only suitable when a single gate instance serves all traffic; tombstones
/// are not shared between processes and do not survive restarts.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    tombstones: Mutex<HashMap<SessionId, Instant>>,
}

impl MemoryRevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tombstones.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.tombstones
            .lock()
            .values()
            .filter(|expires| **expires > now)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevocationStore for MemoryRevocationStore {
    async fn mark_revoked(&self, session_id: &SessionId, ttl: Duration) -> Result<(), Error> {
        let now = Instant::now();
        let expires = now + ttl.min(MAX_TTL);

        let mut tombstones = self.tombstones.lock();
        tombstones.retain(|_, at| *at > now);
        tombstones
            .entry(session_id.clone())
            .and_modify(|at| *at = (*at).max(expires))
            .or_insert(expires);
        Ok(())
    }

    async fn is_revoked(&self, session_id: &SessionId) -> Result<bool, Error> {
        let now = Instant::now();
        Ok(self
            .tombstones
            .lock()
            .get(session_id)
            .is_some_and(|expires| *expires > now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s.to_string())
    }

    #[tokio::test]
    async fn absent_key_is_not_revoked() {
        let store = MemoryRevocationStore::new();
        assert!(!store.is_revoked(&sid("a")).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn mark_is_idempotent() {
        let store = MemoryRevocationStore::new();
        store.mark_revoked(&sid("a"), Duration::from_secs(60)).await.unwrap();
        store.mark_revoked(&sid("a"), Duration::from_secs(60)).await.unwrap();
        assert!(store.is_revoked(&sid("a")).await.unwrap());
        assert!(!store.is_revoked(&sid("b")).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tombstone_expires_after_ttl() {
        let store = MemoryRevocationStore::new();
        store.mark_revoked(&sid("a"), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.is_revoked(&sid("a")).await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.is_revoked(&sid("a")).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn shorter_remark_does_not_shorten_ttl() {
        let store = MemoryRevocationStore::new();
        store.mark_revoked(&sid("a"), Duration::from_secs(100)).await.unwrap();
        store.mark_revoked(&sid("a"), Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(store.is_revoked(&sid("a")).await.unwrap());
    }
}
