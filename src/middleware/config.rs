use std::str::FromStr;
use std::time::Duration;

use super::error::AuthError;
use super::policy::PolicyTable;
use crate::revocation::FailMode;
use crate::session::SessionSettings;

/// Gate configuration.
///
/// Required fields (the two signing keys) are constructor parameters, so there
/// are no runtime "missing field" errors.
///
/// Use [`from_env()`](GateConfig::from_env) for convention-based setup,
/// or [`new()`](GateConfig::new) with `with_*` methods for full control.
pub struct GateConfig {
    pub(super) access_key: Vec<u8>,
    pub(super) refresh_key: Vec<u8>,
    pub(super) session: SessionSettings,
    pub(super) policies: PolicyTable,
    pub(super) auth_path: String,
}

impl GateConfig {
    /// Create config with the access and refresh signing keys.
    ///
    /// All optional fields use sensible defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new(access_key: impl Into<Vec<u8>>, refresh_key: impl Into<Vec<u8>>) -> Self {
        Self {
            access_key: access_key.into(),
            refresh_key: refresh_key.into(),
            session: SessionSettings::default(),
            policies: PolicyTable::default(),
            auth_path: "/users".into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `JWT_ACCESS_KEY`: Access token signing key (at least 64 bytes)
    /// - `JWT_REFRESH_KEY`: Refresh token signing key (at least 64 bytes, distinct)
    ///
    /// # Optional env vars
    /// - `ACCESS_TOKEN_TTL_SECS`: Access token lifetime (default 1800)
    /// - `REFRESH_TOKEN_TTL_SECS`: Refresh token lifetime (default 604800)
    /// - `REVOCATION_FAIL_MODE`: `closed` (default) or `open`
    /// - `REVOCATION_TIMEOUT_MS`: Per-call revocation store timeout (default 300)
    /// - `AUTH_PATH`: Mount prefix for login/logout/refresh routes (default `/users`)
    /// - `CHECK_USER_AGENT`: Set to `"1"` or `"true"` to bind access tokens to the client `User-Agent`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or a value fails to parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let access_key = std::env::var("JWT_ACCESS_KEY")
            .map_err(|_| AuthError::Config("JWT_ACCESS_KEY is required".into()))?;
        let refresh_key = std::env::var("JWT_REFRESH_KEY")
            .map_err(|_| AuthError::Config("JWT_REFRESH_KEY is required".into()))?;

        let mut config = Self::new(access_key, refresh_key);

        if let Some(secs) = env_parse::<u64>("ACCESS_TOKEN_TTL_SECS")? {
            config = config.with_access_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("REFRESH_TOKEN_TTL_SECS")? {
            config = config.with_refresh_ttl(Duration::from_secs(secs));
        }
        if let Some(mode) = env_parse::<FailMode>("REVOCATION_FAIL_MODE")? {
            config = config.with_fail_mode(mode);
        }
        if let Some(ms) = env_parse::<u64>("REVOCATION_TIMEOUT_MS")? {
            config = config.with_store_timeout(Duration::from_millis(ms));
        }
        if let Ok(path) = std::env::var("AUTH_PATH") {
            config = config.with_auth_path(path);
        }

        let check_user_agent = matches!(
            std::env::var("CHECK_USER_AGENT").as_deref(),
            Ok("1") | Ok("true"),
        );

        Ok(config.with_user_agent_check(check_user_agent))
    }

    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.session.access_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.session.refresh_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_fail_mode(mut self, mode: FailMode) -> Self {
        self.session.revocation.fail_mode = mode;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.session.revocation.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent_check(mut self, enabled: bool) -> Self {
        self.session.check_user_agent = enabled;
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.auth_path = format!("/{}", path.trim_matches('/'));
        self
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>, AuthError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AuthError::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
