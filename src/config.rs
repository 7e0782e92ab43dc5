use secrecy::SecretString;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Fallback admin password for local development. Never accepted in production.
pub const LOCAL_ADMIN_PASSWORD: &str = "admin123";

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is immutable
/// once loaded and is pulled into handlers via FromRef, the same way every other
/// piece of the Unified State is.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret handling.
    pub env: Env,
    // The admin secret checked by the credential verifier.
    pub admin_password: SecretString,
    // Authentication attempts allowed per window.
    pub max_auth_attempts: u32,
    // Length of the rate-limit window.
    pub auth_window: Duration,
    // How long an admin session stays valid after login.
    pub session_ttl: Duration,
    // Cosmetic latency applied before answering a login request.
    pub auth_delay: Duration,
    // Number of access attempts kept for the admin dashboard.
    pub access_log_capacity: usize,
    // Upper bound on concurrently open browser sessions.
    pub max_sessions: usize,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: `Local` is forgiving (fallback secret, pretty
/// logs), `Production` demands every secret explicitly and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test
    /// setup. The login delay is zero so tests do not sleep.
    fn default() -> Self {
        Self {
            env: Env::Local,
            admin_password: SecretString::from(LOCAL_ADMIN_PASSWORD.to_string()),
            max_auth_attempts: 5,
            auth_window: Duration::from_secs(15 * 60),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            auth_delay: Duration::ZERO,
            access_log_capacity: 100,
            max_sessions: 10_000,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at
    /// startup. It reads all parameters from environment variables and
    /// implements the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if `ADMIN_PASSWORD` is missing in production, or if any numeric
    /// variable is set but cannot be parsed. The server must not start with a
    /// half-understood configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Admin Secret Resolution
        // Production must set it explicitly; local falls back to the well-known
        // development password.
        let admin_password = match env {
            Env::Production => env::var("ADMIN_PASSWORD")
                .ok()
                .filter(|value| !value.is_empty())
                .expect("FATAL: ADMIN_PASSWORD must be set in production."),
            Env::Local => env::var("ADMIN_PASSWORD")
                .ok()
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| LOCAL_ADMIN_PASSWORD.to_string()),
        };

        let max_auth_attempts: u32 = parse_var("AUTH_MAX_ATTEMPTS", 5);
        assert!(
            max_auth_attempts >= 1,
            "FATAL: AUTH_MAX_ATTEMPTS must be at least 1."
        );

        Self {
            env,
            admin_password: SecretString::from(admin_password),
            max_auth_attempts,
            auth_window: Duration::from_secs(parse_var("AUTH_WINDOW_SECS", 15 * 60)),
            session_ttl: Duration::from_secs(parse_var("ADMIN_SESSION_TTL_SECS", 24 * 60 * 60)),
            auth_delay: Duration::from_millis(parse_var("AUTH_DELAY_MS", 1000)),
            access_log_capacity: parse_var("ACCESS_LOG_CAPACITY", 100),
            max_sessions: parse_var("MAX_BROWSER_SESSIONS", 10_000),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}

/// parse_var
///
/// Reads `key` as a `T`, using `default` when the variable is unset.
fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {key} has an invalid value: {raw:?}")),
        Err(_) => default,
    }
}
