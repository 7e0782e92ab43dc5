use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::{
    access_log::AccessLogState,
    clock::{ClockState, to_delta},
    credentials::VerifierState,
    models::{AccessAttempt, AuthOutcome, KeyChord, SessionStatus},
    rate_limiter::RateLimiter,
    session_store::{ADMIN_TIMESTAMP_KEY, IS_ADMIN_KEY, SessionStoreState},
};

/// Rate-limit key shared by every admin authentication attempt.
pub const ADMIN_AUTH_KEY: &str = "admin_auth";
/// How long an admin session stays valid after activation (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// GateServices
///
/// The collaborators every `SessionGate` shares: one verifier, one rate limiter,
/// one access log and one clock per process. Cloning is cheap (all `Arc`s).
#[derive(Clone)]
pub struct GateServices {
    pub verifier: VerifierState,
    pub limiter: Arc<RateLimiter>,
    pub access_log: AccessLogState,
    pub clock: ClockState,
    pub session_ttl: TimeDelta,
}

impl GateServices {
    pub fn new(
        verifier: VerifierState,
        limiter: Arc<RateLimiter>,
        access_log: AccessLogState,
        clock: ClockState,
        session_ttl: Duration,
    ) -> Self {
        Self {
            verifier,
            limiter,
            access_log,
            clock,
            session_ttl: to_delta(session_ttl),
        }
    }
}

/// AttemptContext
///
/// Who is knocking. Only used to enrich the access log.
#[derive(Debug, Clone, Default)]
pub struct AttemptContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// SessionGate
///
/// The admin-mode state machine of one browser session.
///
/// Admin state is persisted in the injected `SessionStore` under `isAdmin` and
/// `adminTimestamp`; expiry is enforced lazily, on read. The auth modal flag is
/// plain in-memory UI state.
///
/// The two keys only make sense together, so every read-check-clear and every
/// write of them runs under `state_lock`. A reader never sees a half-written
/// activation.
///
/// Nothing here returns an error: every failure (wrong password, exhausted
/// rate limit, missing or expired state) reads as "not admin".
pub struct SessionGate {
    store: SessionStoreState,
    services: GateServices,
    show_auth: AtomicBool,
    state_lock: Mutex<()>,
}

impl SessionGate {
    pub fn new(store: SessionStoreState, services: GateServices) -> Self {
        Self {
            store,
            services,
            show_auth: AtomicBool::new(false),
            state_lock: Mutex::new(()),
        }
    }

    /// authenticate
    ///
    /// Boolean form of [`SessionGate::attempt`]. A rate-limited attempt and a
    /// wrong password both yield `false`.
    pub async fn authenticate(&self, password: &str) -> bool {
        self.attempt(password, &AttemptContext::default())
            .await
            .is_granted()
    }

    /// attempt
    ///
    /// Runs one authentication attempt:
    /// 1. The shared limiter is consulted for `admin_auth`; a denial fails closed
    ///    without looking at the password.
    /// 2. The password goes to the credential verifier.
    /// 3. On success the limiter record is cleared and the session activated.
    ///
    /// Every attempt, whatever its outcome, is written to the access log.
    pub async fn attempt(&self, password: &str, context: &AttemptContext) -> AuthOutcome {
        let limiter = &self.services.limiter;

        let outcome = if !limiter.is_allowed(ADMIN_AUTH_KEY) {
            AuthOutcome::RateLimited
        } else if self.services.verifier.verify(password).await {
            limiter.reset(ADMIN_AUTH_KEY);
            self.activate().await;
            AuthOutcome::Granted
        } else {
            AuthOutcome::Rejected
        };

        self.services.access_log.record(AccessAttempt {
            timestamp: self.services.clock.now(),
            success: outcome.is_granted(),
            outcome,
            ip: context.ip.clone().unwrap_or_else(|| "unknown".to_string()),
            user_agent: context
                .user_agent
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        });

        outcome
    }

    /// Marks the session admin as of now and closes the auth modal.
    pub async fn activate(&self) {
        let now = self.services.clock.now();
        {
            let _guard = self.state_lock.lock().await;
            self.store.set(IS_ADMIN_KEY, "true".to_string()).await;
            self.store
                .set(ADMIN_TIMESTAMP_KEY, now.timestamp_millis().to_string())
                .await;
        }
        self.hide_auth_modal();
        tracing::info!("admin mode activated");
    }

    /// Drops admin state (logout) and closes the auth modal.
    pub async fn deactivate(&self) {
        {
            let _guard = self.state_lock.lock().await;
            self.clear_admin_state().await;
        }
        self.hide_auth_modal();
        tracing::info!("admin mode deactivated");
    }

    /// is_admin_session
    ///
    /// True only while the flag is set and the activation is no older than the
    /// session TTL. Anything else clears the stored state and reports false, so
    /// repeated calls on an expired session stay false and quiet.
    pub async fn is_admin_session(&self) -> bool {
        self.active_since().await.is_some()
    }

    /// restore
    ///
    /// Startup check for a gate attached to a store that may already hold admin
    /// state from earlier in the same browser session.
    pub async fn restore(&self) -> bool {
        let restored = self.is_admin_session().await;
        if restored {
            tracing::info!("restored admin session from session store");
        }
        restored
    }

    pub fn show_auth_modal(&self) {
        self.show_auth.store(true, Ordering::SeqCst);
    }

    pub fn hide_auth_modal(&self) {
        self.show_auth.store(false, Ordering::SeqCst);
    }

    pub fn auth_modal_visible(&self) -> bool {
        self.show_auth.load(Ordering::SeqCst)
    }

    /// handle_key
    ///
    /// Reacts to a key press from the global listener. The admin shortcut opens
    /// the auth modal unless the session is already admin; Escape closes it.
    /// Returns whether the modal is visible afterwards.
    pub async fn handle_key(&self, chord: &KeyChord) -> bool {
        if chord.is_escape() {
            self.hide_auth_modal();
        } else if chord.is_admin_shortcut() && !self.is_admin_session().await {
            tracing::debug!("admin shortcut detected");
            self.show_auth_modal();
        }
        self.auth_modal_visible()
    }

    /// Snapshot for the front-end, taken after the expiry check.
    pub async fn status(&self) -> SessionStatus {
        let activated_at = self.active_since().await;
        SessionStatus {
            is_admin: activated_at.is_some(),
            show_auth: self.auth_modal_visible(),
            activated_at,
            expires_at: activated_at
                .and_then(|at| at.checked_add_signed(self.services.session_ttl)),
        }
    }

    async fn active_since(&self) -> Option<DateTime<Utc>> {
        let _guard = self.state_lock.lock().await;
        let flag = self.store.get(IS_ADMIN_KEY).await;
        let raw_timestamp = self.store.get(ADMIN_TIMESTAMP_KEY).await;

        if flag.is_none() && raw_timestamp.is_none() {
            return None;
        }

        let activated_at = raw_timestamp
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        if let (Some("true"), Some(at)) = (flag.as_deref(), activated_at) {
            if self.services.clock.now() - at <= self.services.session_ttl {
                return Some(at);
            }
        }

        tracing::debug!("admin session expired or invalid, clearing stored state");
        self.clear_admin_state().await;
        None
    }

    /// Callers hold `state_lock`.
    async fn clear_admin_state(&self) {
        self.store.remove(IS_ADMIN_KEY).await;
        self.store.remove(ADMIN_TIMESTAMP_KEY).await;
    }
}
