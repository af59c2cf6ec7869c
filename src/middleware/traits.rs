use std::future::Future;

use super::types::LoginRequest;
use crate::types::SubjectId;

/// Consumer-provided credential check.
///
/// Called by the login endpoint. Return `Ok(None)` for a wrong student id or
/// password; reserve `Err` for infrastructure failures.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialVerifier for MyAppState {
///     async fn verify(
///         &self,
///         login: &LoginRequest,
///     ) -> Result<Option<SubjectId>, Box<dyn std::error::Error + Send + Sync>> {
///         let user = self.user_rpc.check_password(&login.student_id, &login.password).await?;
///         Ok(user.map(|u| SubjectId::from(u.id)))
///     }
/// }
/// ```
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Resolve login credentials to the subject they authenticate.
    fn verify(
        &self,
        login: &LoginRequest,
    ) -> impl Future<Output = Result<Option<SubjectId>, Box<dyn std::error::Error + Send + Sync>>>
           + Send;
}
