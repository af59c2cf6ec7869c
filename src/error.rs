use crate::token::TokenKind;

/// Why a credential was not honored, or why the gate could not decide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No bearer token on a request that needs one.
    #[error("missing credential")]
    MissingCredential,

    /// Token does not parse, or its payload does not match the claim shape.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("bad token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    /// A tombstone exists for the token's session.
    #[error("session revoked")]
    Revoked,

    /// The revocation store could not answer within its deadline.
    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(String),

    /// A token of the wrong kind was presented, e.g. a refresh token at a resource endpoint.
    #[error("policy violation: expected {expected} token, got {found}")]
    PolicyViolation { expected: TokenKind, found: TokenKind },

    #[error("user agent does not match the session")]
    UserAgentMismatch,

    /// Claim serialization or signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),
}
