use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::AccessAttempt;

/// AccessLog
///
/// Sink for admin authentication attempts. The gate records every attempt
/// here; what happens next (structured log line, audit table, remote
/// collector) is up to the implementation.
pub trait AccessLog: Send + Sync {
    fn record(&self, attempt: AccessAttempt);

    /// Most recent attempts, oldest first.
    fn recent(&self) -> Vec<AccessAttempt>;
}

/// AccessLogState
///
/// The concrete type used to share the sink across gates and handlers.
pub type AccessLogState = Arc<dyn AccessLog>;

/// TracingAccessLog
///
/// Emits each attempt as a `tracing` event on the `admin_access` target and
/// keeps the last `capacity` entries in memory for the admin dashboard.
#[derive(Debug)]
pub struct TracingAccessLog {
    capacity: usize,
    entries: Mutex<VecDeque<AccessAttempt>>,
}

impl TracingAccessLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }
}

impl AccessLog for TracingAccessLog {
    fn record(&self, attempt: AccessAttempt) {
        if attempt.success {
            tracing::info!(
                target: "admin_access",
                outcome = ?attempt.outcome,
                ip = %attempt.ip,
                user_agent = %attempt.user_agent,
                at = %attempt.timestamp.to_rfc3339(),
                "admin access attempt"
            );
        } else {
            tracing::warn!(
                target: "admin_access",
                outcome = ?attempt.outcome,
                ip = %attempt.ip,
                user_agent = %attempt.user_agent,
                at = %attempt.timestamp.to_rfc3339(),
                "admin access attempt"
            );
        }

        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(attempt);
    }

    fn recent(&self) -> Vec<AccessAttempt> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}
