use std::time::Duration;

use derive_more::Display;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Error;
use crate::types::{SessionId, SubjectId};

/// Tolerated clock skew between issuer and verifier when checking `exp`.
pub const CLOCK_SKEW_LEEWAY_SECS: u64 = 5;

/// Minimum signing key length in bytes (HS512 block-strength).
pub const MIN_KEY_LEN: usize = 64;

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Which of the two credential families a token belongs to.
///
/// Also the `kid` header value, which selects the verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn key_id(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    fn from_key_id(kid: &str) -> Option<Self> {
        match kid {
            "access" => Some(Self::Access),
            "refresh" => Some(Self::Refresh),
            _ => None,
        }
    }
}

/// Short-lived credential presented on every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaim {
    #[serde(rename = "sub")]
    pub subject_id: SubjectId,
    #[serde(rename = "sid")]
    pub session_id: SessionId,
    #[serde(rename = "ua")]
    pub user_agent: String,
    /// Unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl AccessClaim {
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        session_id: SessionId,
        user_agent: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = unix_now();
        Self {
            subject_id,
            session_id,
            user_agent: user_agent.into(),
            issued_at: now,
            expires_at: expiry_from(now, ttl),
        }
    }
}

/// Long-lived credential, only ever exchanged for a new [`AccessClaim`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaim {
    #[serde(rename = "sub")]
    pub subject_id: SubjectId,
    #[serde(rename = "sid")]
    pub session_id: SessionId,
    #[serde(rename = "ua")]
    pub user_agent: String,
    /// Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl RefreshClaim {
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        session_id: SessionId,
        user_agent: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            subject_id,
            session_id,
            user_agent: user_agent.into(),
            expires_at: expiry_from(unix_now(), ttl),
        }
    }
}

/// Decoded token payload. The `typ` field is the discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "lowercase")]
pub enum Claims {
    Access(AccessClaim),
    Refresh(RefreshClaim),
}

impl Claims {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Access(_) => TokenKind::Access,
            Self::Refresh(_) => TokenKind::Refresh,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Access(c) => &c.session_id,
            Self::Refresh(c) => &c.session_id,
        }
    }
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs and verifies access and refresh tokens with separate HS512 keys.
pub struct TokenCodec {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenCodec {
    /// Builds a codec from the two signing secrets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either key is shorter than [`MIN_KEY_LEN`]
    /// bytes or both keys are identical.
    pub fn new(access_key: &[u8], refresh_key: &[u8]) -> Result<Self, Error> {
        for (name, key) in [("access", access_key), ("refresh", refresh_key)] {
            if key.len() < MIN_KEY_LEN {
                return Err(Error::Config(format!(
                    "{name} signing key too short: expected at least {MIN_KEY_LEN} bytes, got {}",
                    key.len()
                )));
            }
        }
        if access_key == refresh_key {
            return Err(Error::Config(
                "access and refresh signing keys must differ".into(),
            ));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            access: SigningKey::from_secret(access_key),
            refresh: SigningKey::from_secret(refresh_key),
            validation,
        })
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Signs `claims` with the key of its kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if the claims fail to serialize.
    pub fn issue(&self, claims: &Claims) -> Result<String, Error> {
        let kind = claims.kind();
        let mut header = Header::new(ALGORITHM);
        header.kid = Some(kind.key_id().to_owned());
        encode(&header, claims, &self.key(kind).encoding).map_err(|e| Error::Signing(e.to_string()))
    }

    /// Verifies signature and expiry, then decodes the claims.
    ///
    /// The header `kid` selects the key; the payload `typ` must agree with it.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`], [`Error::BadSignature`] or [`Error::Expired`].
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let header = decode_header(token).map_err(|e| Error::MalformedToken(e.to_string()))?;
        let kind = header
            .kid
            .as_deref()
            .and_then(TokenKind::from_key_id)
            .ok_or_else(|| Error::MalformedToken("missing or unknown kid".into()))?;

        let data = decode::<Claims>(token, &self.key(kind).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::Expired,
                ErrorKind::InvalidSignature => Error::BadSignature,
                _ => Error::MalformedToken(e.to_string()),
            })?;

        if data.claims.kind() != kind {
            return Err(Error::MalformedToken(format!(
                "claim type {} does not match key id {kind}",
                data.claims.kind()
            )));
        }
        Ok(data.claims)
    }

    /// Verifies a token that must be an access token.
    ///
    /// # Errors
    ///
    /// As [`verify`](Self::verify), plus [`Error::PolicyViolation`] for a refresh token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaim, Error> {
        match self.verify(token)? {
            Claims::Access(claim) => Ok(claim),
            Claims::Refresh(_) => Err(Error::PolicyViolation {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            }),
        }
    }

    /// Verifies a token that must be a refresh token.
    ///
    /// # Errors
    ///
    /// As [`verify`](Self::verify), plus [`Error::PolicyViolation`] for an access token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaim, Error> {
        match self.verify(token)? {
            Claims::Refresh(claim) => Ok(claim),
            Claims::Access(_) => Err(Error::PolicyViolation {
                expected: TokenKind::Refresh,
                found: TokenKind::Access,
            }),
        }
    }
}

fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn expiry_from(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    const ACCESS_KEY: &[u8] = &[b'a'; 64];
    const REFRESH_KEY: &[u8] = &[b'r'; 64];

    #[test]
    fn kind_display_matches_key_id() {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            assert_eq!(kind.to_string(), kind.key_id());
            assert_eq!(TokenKind::from_key_id(&kind.to_string()), Some(kind));
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(ACCESS_KEY, REFRESH_KEY).unwrap()
    }

    fn access_claim(ttl_secs: i64) -> AccessClaim {
        let now = unix_now();
        AccessClaim {
            subject_id: SubjectId::from(42_i64),
            session_id: SessionId::from("sess-abc".to_string()),
            user_agent: "test-agent/1.0".into(),
            issued_at: now,
            expires_at: now + ttl_secs,
        }
    }

    fn refresh_claim() -> RefreshClaim {
        RefreshClaim::new(
            SubjectId::from(42_i64),
            SessionId::from("sess-abc".to_string()),
            "test-agent/1.0",
            Duration::from_secs(7 * 24 * 3600),
        )
    }

    #[test]
    fn access_roundtrip() {
        let codec = codec();
        let claims = Claims::Access(access_claim(1800));
        let token = codec.issue(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn refresh_roundtrip() {
        let codec = codec();
        let claims = Claims::Refresh(refresh_claim());
        let token = codec.issue(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn issue_is_deterministic() {
        let codec = codec();
        let claims = Claims::Access(access_claim(1800));
        assert_eq!(codec.issue(&claims).unwrap(), codec.issue(&claims).unwrap());
    }

    #[test]
    fn header_carries_kind_as_kid() {
        let codec = codec();
        let token = codec.issue(&Claims::Refresh(refresh_claim())).unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("refresh"));
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn access_token_does_not_verify_under_refresh_key() {
        let token = codec().issue(&Claims::Access(access_claim(1800))).unwrap();
        // Same kid, keys swapped: the access token is checked against the old refresh key.
        let swapped = TokenCodec::new(REFRESH_KEY, ACCESS_KEY).unwrap();
        assert_eq!(swapped.verify(&token), Err(Error::BadSignature));
    }

    #[test]
    fn refresh_token_does_not_verify_under_access_key() {
        let token = codec().issue(&Claims::Refresh(refresh_claim())).unwrap();
        let swapped = TokenCodec::new(REFRESH_KEY, ACCESS_KEY).unwrap();
        assert_eq!(swapped.verify(&token), Err(Error::BadSignature));
    }

    #[test]
    fn relabelled_kid_fails_signature() {
        let codec = codec();
        let token = codec.issue(&Claims::Access(access_claim(1800))).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut header = Header::new(ALGORITHM);
        header.kid = Some("refresh".into());
        let forged_header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let forged = format!("{forged_header}.{}.{}", parts[1], parts[2]);

        assert_eq!(codec.verify(&forged), Err(Error::BadSignature));
    }

    #[test]
    fn expired_token_rejected() {
        let codec = codec();
        let token = codec.issue(&Claims::Access(access_claim(-3600))).unwrap();
        assert_eq!(codec.verify(&token), Err(Error::Expired));
    }

    #[test]
    fn expired_token_with_foreign_signature_rejected() {
        let token = codec().issue(&Claims::Access(access_claim(-3600))).unwrap();
        let other = TokenCodec::new(&[b'x'; 64], &[b'y'; 64]).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.verify(""), Err(Error::MalformedToken(_))));
        assert!(matches!(codec.verify("not-a-token"), Err(Error::MalformedToken(_))));
        assert!(matches!(
            codec.verify("eyJhbGciOiJIUzUxMiJ9.e30"),
            Err(Error::MalformedToken(_))
        ));
    }

    #[test]
    fn missing_kid_is_malformed() {
        let header = Header::new(ALGORITHM);
        let token = encode(
            &header,
            &Claims::Access(access_claim(1800)),
            &EncodingKey::from_secret(ACCESS_KEY),
        )
        .unwrap();
        assert!(matches!(codec().verify(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn payload_kind_must_match_kid() {
        // Refresh-shaped payload signed with the access key under kid=access.
        let mut header = Header::new(ALGORITHM);
        header.kid = Some("access".into());
        let token = encode(
            &header,
            &Claims::Refresh(refresh_claim()),
            &EncodingKey::from_secret(ACCESS_KEY),
        )
        .unwrap();
        assert!(matches!(codec().verify(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn wrong_algorithm_is_malformed() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("access".into());
        let token = encode(
            &header,
            &Claims::Access(access_claim(1800)),
            &EncodingKey::from_secret(ACCESS_KEY),
        )
        .unwrap();
        assert!(matches!(codec().verify(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn verify_access_rejects_refresh_token() {
        let codec = codec();
        let token = codec.issue(&Claims::Refresh(refresh_claim())).unwrap();
        assert_eq!(
            codec.verify_access(&token),
            Err(Error::PolicyViolation {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            })
        );
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let codec = codec();
        let token = codec.issue(&Claims::Access(access_claim(1800))).unwrap();
        assert!(matches!(
            codec.verify_refresh(&token),
            Err(Error::PolicyViolation { found: TokenKind::Access, .. })
        ));
    }

    #[test]
    fn short_key_is_config_error() {
        assert!(matches!(
            TokenCodec::new(b"short", REFRESH_KEY),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn identical_keys_are_config_error() {
        assert!(matches!(
            TokenCodec::new(ACCESS_KEY, ACCESS_KEY),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn claim_constructors_apply_ttl() {
        let claim = AccessClaim::new(
            SubjectId::from(1_i64),
            SessionId::generate(),
            "ua",
            Duration::from_secs(1800),
        );
        assert_eq!(claim.expires_at - claim.issued_at, 1800);
    }
}
