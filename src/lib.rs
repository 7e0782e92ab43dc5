use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access-control core.
pub mod access_log;
pub mod clock;
pub mod credentials;
pub mod gate;
pub mod rate_limiter;
pub mod registry;
pub mod session_store;

// HTTP surface and configuration.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;

// Module for routing segregation (Public, Session, Admin).
pub mod routes;
use routes::{admin, public, session};
use auth::AdminSession;

// --- Public Re-exports ---

pub use access_log::{AccessLog, AccessLogState, TracingAccessLog};
pub use clock::{Clock, ClockState, ManualClock, SystemClock};
pub use config::AppConfig;
pub use credentials::{CredentialVerifier, StaticSecretVerifier, VerifierState};
pub use gate::{GateServices, SessionGate};
pub use rate_limiter::{RateLimiter, RateLimiterState};
pub use registry::{SessionRegistry, SessionRegistryState};
pub use session_store::{InMemorySessionStore, SessionStore, SessionStoreState};

/// ApiDoc
///
/// Auto-generates the OpenAPI document for the admin access API from the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` annotations.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::open_session, handlers::get_session, handlers::close_session,
        handlers::key_event,
        handlers::show_auth_modal, handlers::hide_auth_modal, handlers::login,
        handlers::logout, handlers::get_access_attempts, handlers::get_rate_limit,
        handlers::reset_rate_limit
    ),
    components(
        schemas(
            models::AuthOutcome, models::AccessAttempt, models::KeyChord,
            models::LoginRequest, models::SessionStatus, models::NewSession,
            models::RateLimitSnapshot,
        )
    ),
    tags(
        (name = "media-portal", description = "Media portal admin access API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, cloneable container
/// holding every service the handlers need. Built once in `main` (or in a
/// test) and shared across all requests; there is no ambient global state.
#[derive(Clone)]
pub struct AppState {
    /// Browser sessions and their gates.
    pub sessions: SessionRegistryState,
    /// The limiter shared by every gate (also exposed to admin routes).
    pub limiter: RateLimiterState,
    /// The access log shared by every gate (read by admin routes).
    pub access_log: AccessLogState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// from_config
    ///
    /// Wires the whole access-control core from configuration: a static-secret
    /// verifier, one rate limiter, one tracing access log and a session
    /// registry, all driven by `clock`.
    pub fn from_config(config: AppConfig, clock: ClockState) -> Self {
        let verifier: VerifierState =
            Arc::new(StaticSecretVerifier::new(config.admin_password.clone()));
        let limiter: RateLimiterState = Arc::new(RateLimiter::new(
            config.max_auth_attempts,
            config.auth_window,
            clock.clone(),
        ));
        let access_log: AccessLogState =
            Arc::new(TracingAccessLog::new(config.access_log_capacity));

        let services = GateServices::new(
            verifier,
            limiter.clone(),
            access_log.clone(),
            clock,
            config.session_ttl,
        );
        let sessions = Arc::new(SessionRegistry::new(services, config.max_sessions));

        Self {
            sessions,
            limiter,
            access_log,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These let handlers and extractors pull single components out of AppState.

impl FromRef<AppState> for SessionRegistryState {
    fn from_ref(app_state: &AppState) -> SessionRegistryState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for RateLimiterState {
    fn from_ref(app_state: &AppState) -> RateLimiterState {
        app_state.limiter.clone()
    }
}

impl FromRef<AppState> for AccessLogState {
    fn from_ref(app_state: &AppState) -> AccessLogState {
        app_state.access_log.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// admin_middleware
///
/// Route layer of the `/admin` router. Extracting `AdminSession` is the whole
/// check: 401 for a missing or unknown session, 403 unless the gate reports a
/// live admin session.
async fn admin_middleware(_admin: AdminSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// create_router
///
/// Public, session and admin routes on one `AppState`, plus the API docs.
/// Every response carries an `x-request-id`, and each request is traced in a
/// span tagged with it.
pub fn create_router(state: AppState) -> Router {
    // The front-end is served from another origin.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let admin_guard = middleware::from_fn_with_state(state.clone(), admin_middleware);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(session::session_routes())
        .nest("/admin", admin::admin_routes().route_layer(admin_guard))
        .with_state(state);

    // Outermost first: id assigned, request traced, id echoed on the response.
    let observability = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id));

    app.layer(observability).layer(cors)
}

fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let req_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        req_id,
    )
}
