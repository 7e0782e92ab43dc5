/// Router Module Index
///
/// Organizes the routing logic into access-segregated modules. Access control
/// is applied per module (via extractors and Axum layers), so an endpoint's
/// exposure is decided by the file it lives in.

/// Routes accessible to anyone: health check and session bootstrap.
pub mod public;

/// Routes scoped to one browser session (`x-session-id`).
/// Requires a session opened through POST /sessions.
pub mod session;

/// Routes restricted to sessions in live admin mode.
/// Wrapped in the admin middleware layer.
pub mod admin;
