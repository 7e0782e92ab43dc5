use media_portal::{
    AppState,
    clock::{ClockState, SystemClock},
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: loads configuration, initializes logging,
/// wires the access-control core and starts the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "media_portal=debug,admin_access=info,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.env == Env::Local && std::env::var("ADMIN_PASSWORD").is_err() {
        tracing::warn!("ADMIN_PASSWORD not set, using the local development password");
    }

    // 4. Unified State Assembly
    // One limiter, verifier, access log and session registry for the process.
    let clock: ClockState = Arc::new(SystemClock);
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::from_config(config, clock);

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
