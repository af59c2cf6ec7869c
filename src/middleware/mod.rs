//! Plug-and-play session gate for Axum.
//!
//! Wraps any router with bearer-token authorization and mounts the three
//! credential endpoints (login, logout, refresh) next to it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use session_gate::RedisRevocationStore;
//! use session_gate::middleware::{
//!     AccessGate, AccessPolicy, GateConfig, PolicyTable, auth_routes, protect,
//! };
//!
//! // 1. Implement CredentialVerifier for your app
//! // 2. Configure from environment
//! let policies = PolicyTable::from_routes(AccessPolicy::Required, [
//!     ("/evaluations/list/all", AccessPolicy::Optional),
//!     ("/evaluations/{id}/detail", AccessPolicy::Optional),
//! ])?;
//! let config = GateConfig::from_env()?.with_policies(policies);
//! let store = RedisRevocationStore::from_env().await?;
//! let gate = Arc::new(AccessGate::new(config, store)?);
//!
//! // 3. Protect your routes and mount the auth routes
//! let app = protect(api_router, gate.clone())
//!     .merge(auth_routes(gate, verifier));
//!
//! // 4. Take `Principal` or `Option<Principal>` in handlers
//! ```

mod config;
mod error;
mod extractor;
mod gate;
mod headers;
mod policy;
mod routes;
mod state;
mod traits;
mod types;

pub use config::GateConfig;
pub use error::AuthError;
pub use gate::{AccessGate, Decision, protect, require_session};
pub use headers::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};
pub use policy::{AccessPolicy, PolicyTable};
pub use routes::auth_routes;
pub use traits::CredentialVerifier;
pub use types::{ApiResult, LoginRequest, codes};
