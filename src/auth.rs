use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{gate::SessionGate, registry::SessionRegistryState};

/// Header carrying the browser session id handed out by POST /sessions.
pub const SESSION_HEADER: &str = "x-session-id";

/// BrowserSession Extractor Result
///
/// The resolved browser session of a request: its id and the gate that holds
/// its admin state. Handlers use the gate to authenticate, log out or toggle
/// the auth modal.
#[derive(Clone)]
pub struct BrowserSession {
    pub id: Uuid,
    pub gate: Arc<SessionGate>,
}

/// BrowserSession Extractor Implementation
///
/// Implements Axum's FromRequestParts so any session-scoped handler can take a
/// `BrowserSession` argument.
///
/// 1. Dependency Resolution: pull the SessionRegistry from the app state.
/// 2. Header Extraction: read `x-session-id` and parse it as a UUID.
/// 3. Registry Lookup: the id must belong to a session this process opened.
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
    SessionRegistryState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let registry = SessionRegistryState::from_ref(state);

        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Ids are minted server-side only; an unknown id is never adopted.
        let gate = registry.get(&id).ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(BrowserSession { id, gate })
    }
}

/// AdminSession Extractor Result
///
/// A browser session whose admin flag is set and not expired.
#[derive(Clone)]
pub struct AdminSession(pub BrowserSession);

/// AdminSession Extractor Implementation
///
/// Resolves the `BrowserSession` first (401 on failure), then runs the gate's
/// lazy expiry check. A session that is not, or no longer, admin is rejected
/// with StatusCode::FORBIDDEN (403).
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionRegistryState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = BrowserSession::from_request_parts(parts, state).await?;

        if !session.gate.is_admin_session().await {
            tracing::debug!(session_id = %session.id, "admin route refused for non-admin session");
            return Err(StatusCode::FORBIDDEN);
        }

        Ok(AdminSession(session))
    }
}
