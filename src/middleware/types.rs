use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Business result codes carried in [`ApiResult::code`]. `0` is success.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    /// Login request did not pass validation.
    pub const USER_INVALID_INPUT: i32 = 401_001;
    /// Student id or password rejected by the credential verifier.
    pub const USER_INVALID_CREDENTIALS: i32 = 401_002;
    pub const INTERNAL_SERVER_ERROR: i32 = 500_001;
}

/// JSON envelope returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub code: i32,
    pub msg: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: codes::SUCCESS,
            msg: "Success".into(),
            data: None,
        }
    }

    #[must_use]
    pub fn failure(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

impl IntoResponse for ApiResult {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Credentials posted to the login endpoint.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("student_id", &self.student_id)
            .field("password", &"<redacted>")
            .finish()
    }
}
