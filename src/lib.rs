#![doc = include_str!("../README.md")]

pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod revocation;
pub mod session;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
#[cfg(feature = "redis")]
pub use revocation::RedisRevocationStore;
pub use revocation::{FailMode, MemoryRevocationStore, RevocationPolicy, RevocationStore};
pub use session::{IssuedSession, SessionManager, SessionSettings};
pub use token::{AccessClaim, Claims, RefreshClaim, TokenCodec, TokenKind};
pub use types::{Principal, SessionId, SubjectId};
