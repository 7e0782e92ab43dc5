use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::{
    gate::{GateServices, SessionGate},
    session_store::{InMemorySessionStore, SessionStoreState},
};

struct SessionEntry {
    gate: Arc<SessionGate>,
    last_seen: DateTime<Utc>,
}

/// SessionRegistry
///
/// Maps browser session ids to their `SessionGate`. Each session gets its own
/// store (so admin state never leaks between browsers) while sharing the
/// verifier, the rate limiter, the access log and the clock.
///
/// The registry is bounded: once `max_sessions` are open, `open` refuses new
/// ones instead of growing without limit. Sessions untouched for longer than
/// the admin session TTL are pruned before that check, so abandoned ids free
/// their slot. A live admin session is never pruned this way: its activation
/// is at least as old as its last lookup.
pub struct SessionRegistry {
    services: GateServices,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(services: GateServices, max_sessions: usize) -> Self {
        Self {
            services,
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
        }
    }

    /// open
    ///
    /// Starts a new browser session backed by a fresh in-memory store.
    /// Returns `None` when the registry is full.
    pub fn open(&self) -> Option<(Uuid, Arc<SessionGate>)> {
        self.attach(Arc::new(InMemorySessionStore::new()))
    }

    /// attach
    ///
    /// Registers a gate over an existing store under a new id. Whatever admin
    /// state the store already holds is picked up on the gate's next read.
    pub fn attach(&self, store: SessionStoreState) -> Option<(Uuid, Arc<SessionGate>)> {
        let now = self.services.clock.now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        // 1. Free the slots of sessions nobody has used within the TTL.
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.services.session_ttl);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned idle browser sessions");
        }

        // 2. Capacity check.
        if sessions.len() >= self.max_sessions {
            tracing::warn!(
                max_sessions = self.max_sessions,
                "session registry full, refusing new browser session"
            );
            return None;
        }

        let id = Uuid::new_v4();
        let gate = Arc::new(SessionGate::new(store, self.services.clone()));
        sessions.insert(
            id,
            SessionEntry {
                gate: gate.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(session_id = %id, "browser session opened");
        Some((id, gate))
    }

    /// get
    ///
    /// Looks a session up and marks it as seen now.
    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionGate>> {
        let now = self.services.clock.now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(entry.gate.clone())
    }

    /// close
    ///
    /// Forgets a browser session. Returns whether the id was open.
    pub fn close(&self, id: &Uuid) -> bool {
        let closed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if closed {
            tracing::debug!(session_id = %id, "browser session closed");
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SessionRegistryState
///
/// The concrete type used to share the registry across the application state.
pub type SessionRegistryState = Arc<SessionRegistry>;
