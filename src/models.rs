use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Access-Control Schemas ---

/// AuthOutcome
///
/// The result of one authentication attempt. `Rejected` and `RateLimited` both
/// deny access; they are kept apart so callers can choose whether to reveal
/// which one happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AuthOutcome {
    Granted,
    Rejected,
    RateLimited,
}

impl AuthOutcome {
    pub fn is_granted(self) -> bool {
        self == AuthOutcome::Granted
    }
}

/// AccessAttempt
///
/// One entry of the admin access log. Written for every attempt, whatever its
/// outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessAttempt {
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub outcome: AuthOutcome,
    // Client address as reported by the proxy, or "unknown".
    pub ip: String,
    pub user_agent: String,
}

/// KeyChord
///
/// A key press forwarded by the front-end's global keyboard listener.
/// `code` is the physical key (`"KeyQ"`), `key` the produced value (`"Escape"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct KeyChord {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub alt_key: bool,
}

impl KeyChord {
    /// Ctrl + Alt + Q: the hidden shortcut that asks for the auth modal.
    pub fn is_admin_shortcut(&self) -> bool {
        self.ctrl_key && self.alt_key && self.code == "KeyQ"
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape"
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Body of POST /auth/login. The password is only passed to the credential
/// verifier and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub password: String,
}

// --- Response Schemas (Output) ---

/// SessionStatus
///
/// What the front-end needs to render the admin toggle and the auth modal.
/// Computed after the lazy expiration check, so `is_admin` is never stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionStatus {
    pub is_admin: bool,
    pub show_auth: bool,
    #[ts(type = "string | null")]
    pub activated_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// NewSession
///
/// Returned by POST /sessions. The id must be sent back in `x-session-id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NewSession {
    pub session_id: Uuid,
}

/// RateLimitSnapshot
///
/// Admin view of the authentication limiter (GET /admin/rate-limit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RateLimitSnapshot {
    pub key: String,
    pub count: u32,
    pub max_attempts: u32,
    pub window_secs: i64,
    #[ts(type = "string | null")]
    pub window_start: Option<DateTime<Utc>>,
    pub exhausted: bool,
}
