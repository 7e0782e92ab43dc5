use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session Router Module
///
/// Endpoints acting on the caller's own browser session. Every handler takes
/// the `BrowserSession` extractor, so a missing or unknown `x-session-id` is
/// rejected with 401 before any handler logic runs.
pub fn session_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/session
        // Admin flag, modal visibility and expiry, after the lazy expiry check.
        // DELETE /auth/session
        // Ends the browser session and frees its registry slot.
        .route(
            "/auth/session",
            get(handlers::get_session).delete(handlers::close_session),
        )
        // POST /auth/keys
        // Key presses from the global keyboard listener (admin shortcut, Escape).
        .route("/auth/keys", post(handlers::key_event))
        // POST/DELETE /auth/modal
        // Explicit open/close of the authentication modal.
        .route(
            "/auth/modal",
            post(handlers::show_auth_modal).delete(handlers::hide_auth_modal),
        )
        // POST /auth/login
        // Password submission. Rate limited on the shared `admin_auth` key.
        .route("/auth/login", post(handlers::login))
        // POST /auth/logout
        // Leaves admin mode.
        .route("/auth/logout", post(handlers::logout))
}
