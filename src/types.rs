use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use derive_more::{Display, From, Into};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier of the authenticated principal (opaque string).
///
/// Numeric ids from the user service convert with `SubjectId::from(42_i64)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Session identifier, stable across access-token refreshes.
///
/// Also the key of the session's revocation tombstone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a fresh session id from 128 bits of OS randomness.
    ///
    /// Returns a 22-character URL-safe string (16 random bytes → base64url).
    #[must_use]
    pub fn generate() -> Self {
        let random_bytes: [u8; 16] = rand::rng().random();
        Self(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity resolved for an authorized request.
///
/// Inserted into request extensions by the gate; handlers never see raw claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    /// `User-Agent` captured when the session was issued.
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_length_and_alphabet() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 22);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "session id should be URL-safe: {id}"
        );
    }

    #[test]
    fn session_id_uniqueness() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b, "session ids should be unique");
    }

    #[test]
    fn subject_id_from_numeric() {
        let id = SubjectId::from(42_i64);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id, SubjectId::from("42"));
    }

    #[test]
    fn subject_id_serde_is_transparent() {
        let id = SubjectId::from(7_i64);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7\"");
        let parsed: SubjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_subject(_: &SubjectId) {}
        fn takes_session(_: &SessionId) {}

        let subject = SubjectId::from("id");
        let session = SessionId::from("id".to_string());

        takes_subject(&subject);
        takes_session(&session);
        // takes_subject(&session);  // Compile error!
    }
}
