use crate::{
    AppState,
    auth::BrowserSession,
    gate::{ADMIN_AUTH_KEY, AttemptContext},
    models::{
        AccessAttempt, AuthOutcome, KeyChord, LoginRequest, NewSession, RateLimitSnapshot,
        SessionStatus,
    },
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};

// --- Handlers ---

/// open_session
///
/// [Public Route] Starts a browser session and returns its id. The front-end
/// sends the id back in `x-session-id` on every session-scoped call.
///
/// Returns 503 when the registry has reached its configured capacity.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session opened", body = NewSession),
        (status = 503, description = "Too many open sessions")
    )
)]
pub async fn open_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<NewSession>), StatusCode> {
    match state.sessions.open() {
        Some((session_id, _gate)) => Ok((StatusCode::CREATED, Json(NewSession { session_id }))),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// get_session
///
/// [Session Route] Current admin/modal state. Reading it runs the lazy expiry
/// check, so an expired admin session is cleared here.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session status", body = SessionStatus),
        (status = 401, description = "Missing or unknown session")
    )
)]
pub async fn get_session(BrowserSession { gate, .. }: BrowserSession) -> Json<SessionStatus> {
    Json(gate.status().await)
}

/// key_event
///
/// [Session Route] Receives a key press from the front-end's global listener.
/// Ctrl + Alt + Q opens the auth modal (ignored while admin); Escape closes it.
#[utoipa::path(
    post,
    path = "/auth/keys",
    request_body = KeyChord,
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn key_event(
    BrowserSession { gate, .. }: BrowserSession,
    Json(chord): Json<KeyChord>,
) -> Json<SessionStatus> {
    gate.handle_key(&chord).await;
    Json(gate.status().await)
}

/// close_session
///
/// [Session Route] Ends the browser session: admin state is dropped and the id
/// stops resolving. A tab that goes on must open a new session.
#[utoipa::path(
    delete,
    path = "/auth/session",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Missing or unknown session")
    )
)]
pub async fn close_session(
    BrowserSession { id, gate }: BrowserSession,
    State(state): State<AppState>,
) -> StatusCode {
    gate.deactivate().await;
    state.sessions.close(&id);
    StatusCode::NO_CONTENT
}

/// show_auth_modal
///
/// [Session Route] Opens the auth modal explicitly.
#[utoipa::path(
    post,
    path = "/auth/modal",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn show_auth_modal(BrowserSession { gate, .. }: BrowserSession) -> Json<SessionStatus> {
    gate.show_auth_modal();
    Json(gate.status().await)
}

/// hide_auth_modal
///
/// [Session Route] Closes the auth modal.
#[utoipa::path(
    delete,
    path = "/auth/modal",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn hide_auth_modal(BrowserSession { gate, .. }: BrowserSession) -> Json<SessionStatus> {
    gate.hide_auth_modal();
    Json(gate.status().await)
}

/// login
///
/// [Session Route] Submits the admin password.
///
/// *Flow*: waits the configured cosmetic delay, then runs one gate attempt.
/// A wrong password maps to 401; an exhausted rate limit maps to 429 so the UI
/// can tell the user to wait instead of retyping.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin mode active", body = SessionStatus),
        (status = 401, description = "Wrong password"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn login(
    BrowserSession { id, gate }: BrowserSession,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionStatus>, StatusCode> {
    if !state.config.auth_delay.is_zero() {
        tokio::time::sleep(state.config.auth_delay).await;
    }

    let context = attempt_context(&headers);
    match gate.attempt(&payload.password, &context).await {
        AuthOutcome::Granted => Ok(Json(gate.status().await)),
        AuthOutcome::Rejected => Err(StatusCode::UNAUTHORIZED),
        AuthOutcome::RateLimited => {
            tracing::warn!(session_id = %id, "too many admin login attempts");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

/// logout
///
/// [Session Route] Leaves admin mode. Idempotent.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(BrowserSession { gate, .. }: BrowserSession) -> StatusCode {
    gate.deactivate().await;
    StatusCode::NO_CONTENT
}

/// get_access_attempts
///
/// [Admin Route] Behind the admin middleware. The most recent admin authentication attempts, oldest first.
#[utoipa::path(
    get,
    path = "/admin/access-attempts",
    responses(
        (status = 200, description = "Recent attempts", body = [AccessAttempt]),
        (status = 403, description = "Not an admin session")
    )
)]
pub async fn get_access_attempts(State(state): State<AppState>) -> Json<Vec<AccessAttempt>> {
    Json(state.access_log.recent())
}

/// get_rate_limit
///
/// [Admin Route] State of the authentication limiter for `admin_auth`.
#[utoipa::path(
    get,
    path = "/admin/rate-limit",
    responses((status = 200, description = "Limiter state", body = RateLimitSnapshot))
)]
pub async fn get_rate_limit(State(state): State<AppState>) -> Json<RateLimitSnapshot> {
    let limiter = &state.limiter;
    let record = limiter.snapshot(ADMIN_AUTH_KEY);
    let count = record.map(|r| r.count).unwrap_or(0);

    Json(RateLimitSnapshot {
        key: ADMIN_AUTH_KEY.to_string(),
        count,
        max_attempts: limiter.max_attempts(),
        window_secs: limiter.window().num_seconds(),
        window_start: record.map(|r| r.window_start),
        exhausted: count >= limiter.max_attempts(),
    })
}

/// reset_rate_limit
///
/// [Admin Route] Clears the `admin_auth` penalty box immediately.
#[utoipa::path(
    delete,
    path = "/admin/rate-limit",
    responses((status = 204, description = "Limiter reset"))
)]
pub async fn reset_rate_limit(
    BrowserSession { id, .. }: BrowserSession,
    State(state): State<AppState>,
) -> StatusCode {
    state.limiter.reset(ADMIN_AUTH_KEY);
    tracing::info!(session_id = %id, "admin auth rate limit reset");
    StatusCode::NO_CONTENT
}

/// attempt_context
///
/// Pulls the client address (first `x-forwarded-for` hop, then `x-real-ip`)
/// and the user agent out of the request headers for the access log.
fn attempt_context(headers: &HeaderMap) -> AttemptContext {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let ip = header_str("x-forwarded-for")
        .and_then(|chain| chain.split(',').next().map(|hop| hop.trim().to_string()))
        .filter(|hop| !hop.is_empty())
        .or_else(|| header_str("x-real-ip"));

    AttemptContext {
        ip,
        user_agent: header_str(header::USER_AGENT.as_str()),
    }
}
