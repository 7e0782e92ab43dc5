use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session at all.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /sessions
        // Opens a browser session and returns the id the client must echo in
        // `x-session-id`. Session ids are only ever minted here.
        .route("/sessions", post(handlers::open_session))
}
