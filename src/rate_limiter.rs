use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::clock::{ClockState, to_delta};

/// Default number of attempts allowed per window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default window length (15 minutes).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// AttemptRecord
///
/// The per-key tally kept by the limiter. `count` is the number of allowed
/// attempts since `window_start` and never exceeds the limiter's maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

/// RateLimiter
///
/// Fixed-window attempt counter keyed by an arbitrary string (the gate uses
/// `"admin_auth"`). State lives only in process memory: a restart clears every
/// window.
///
/// Per key the record moves `NoRecord -> Active(count, window_start)`. Once the
/// window has elapsed the next call opens a fresh `Active(1, now)`. While
/// `count >= max_attempts` calls are denied without touching the record.
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, AttemptRecord>>,
    max_attempts: u32,
    window: TimeDelta,
    clock: ClockState,
}

impl RateLimiter {
    /// new
    ///
    /// Builds a limiter allowing `max_attempts` calls per `window`.
    /// A `max_attempts` of zero is raised to one: the first call of a window is
    /// always allowed.
    pub fn new(max_attempts: u32, window: Duration, clock: ClockState) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
            window: to_delta(window),
            clock,
        }
    }

    /// 5 attempts per 15 minutes.
    pub fn with_defaults(clock: ClockState) -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW, clock)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// is_allowed
    ///
    /// Records an attempt for `key` and reports whether it may proceed.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(record) = attempts.get_mut(key) {
            if now - record.window_start <= self.window {
                if record.count >= self.max_attempts {
                    tracing::debug!(key, count = record.count, "rate limit exhausted");
                    return false;
                }
                record.count += 1;
                return true;
            }
        }

        // No record yet, or the previous window has elapsed.
        attempts.insert(
            key.to_string(),
            AttemptRecord {
                count: 1,
                window_start: now,
            },
        );
        true
    }

    /// reset
    ///
    /// Forgets everything about `key`. Called after a successful
    /// authentication so the next failure starts from a clean slate.
    pub fn reset(&self, key: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Current record for `key` while its window is still open.
    /// Does not count as an attempt.
    pub fn snapshot(&self, key: &str) -> Option<AttemptRecord> {
        let now = self.clock.now();
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .filter(|record| now - record.window_start <= self.window)
    }
}

/// RateLimiterState
///
/// The concrete type used to share the limiter across gates and handlers.
pub type RateLimiterState = Arc<RateLimiter>;
