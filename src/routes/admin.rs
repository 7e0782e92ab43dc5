use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Endpoints exclusively accessible to sessions in admin mode.
///
/// Access Control:
/// The router is wrapped in the admin middleware layer (see `create_router`).
/// It resolves `AdminSession` once per request, rejecting an unknown session
/// with 401 and a non-admin or expired one with 403, so the handlers
/// themselves carry no admin check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/access-attempts
        // Recent authentication attempts (granted, rejected, rate limited).
        .route("/access-attempts", get(handlers::get_access_attempts))
        // GET/DELETE /admin/rate-limit
        // Inspect or clear the `admin_auth` limiter record.
        .route(
            "/rate-limit",
            get(handlers::get_rate_limit).delete(handlers::reset_rate_limit),
        )
}
