use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key holding the admin flag. The only value ever written is `"true"`.
pub const IS_ADMIN_KEY: &str = "isAdmin";
/// Key holding the activation instant, as epoch milliseconds in decimal.
pub const ADMIN_TIMESTAMP_KEY: &str = "adminTimestamp";

// 1. SessionStore Contract
/// SessionStore
///
/// Defines the key-value contract used to persist a single browser session's
/// admin state. The gate only ever talks to this trait, so the backing store
/// can be swapped (in-memory for tests and the default server, a server-side
/// session table or an encrypted local store elsewhere) without touching the
/// callers.
///
/// Values are plain strings, mirroring the session storage API the front-end
/// already speaks.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String);

    /// Deletes `key`. Removing a missing key is a no-op.
    async fn remove(&self, key: &str);

    /// Deletes every key of this session.
    async fn clear(&self);
}

// 2. The In-Memory Implementation
/// InMemorySessionStore
///
/// A `HashMap` behind a mutex. Lives exactly as long as the browser session
/// that owns it, which matches the lifetime of browser session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    async fn clear(&self) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// SessionStoreState
///
/// The concrete type used to hand a session store to a gate.
pub type SessionStoreState = Arc<dyn SessionStore>;
