use chrono::DateTime;
use media_portal::{
    access_log::TracingAccessLog,
    clock::{Clock, ClockState, ManualClock},
    credentials::StaticSecretVerifier,
    gate::{DEFAULT_SESSION_TTL, GateServices},
    rate_limiter::RateLimiter,
    registry::SessionRegistry,
    session_store::{ADMIN_TIMESTAMP_KEY, IS_ADMIN_KEY, InMemorySessionStore, SessionStore},
};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

// --- Test Utilities ---

const HOUR: Duration = Duration::from_secs(60 * 60);

fn registry_with(max_sessions: usize) -> (Arc<ManualClock>, SessionRegistry) {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_735_689_600, 0).unwrap(),
    ));
    let services = GateServices::new(
        Arc::new(StaticSecretVerifier::new(SecretString::from("pw".to_string()))),
        Arc::new(RateLimiter::with_defaults(clock.clone() as ClockState)),
        Arc::new(TracingAccessLog::new(10)),
        clock.clone(),
        DEFAULT_SESSION_TTL,
    );
    (clock, SessionRegistry::new(services, max_sessions))
}

// --- Tests ---

#[test]
fn test_full_registry_refuses_new_session() {
    let (_clock, registry) = registry_with(2);

    assert!(registry.open().is_some());
    assert!(registry.open().is_some());
    assert!(registry.open().is_none());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_idle_sessions_are_pruned_when_full() {
    let (clock, registry) = registry_with(3);
    let ids: Vec<_> = (0..3).map(|_| registry.open().unwrap().0).collect();
    assert!(registry.open().is_none());

    clock.advance(7 * 24 * HOUR);

    let (fresh, _gate) = registry.open().expect("idle sessions should free their slots");
    assert_eq!(registry.len(), 1);
    assert!(registry.get(&fresh).is_some());
    for id in &ids {
        assert!(registry.get(id).is_none());
    }
}

#[test]
fn test_recently_used_session_survives_pruning() {
    let (clock, registry) = registry_with(2);
    let (kept, _) = registry.open().unwrap();
    let (stale, _) = registry.open().unwrap();

    clock.advance(23 * HOUR);
    assert!(registry.get(&kept).is_some());
    clock.advance(2 * HOUR);

    assert!(registry.open().is_some());
    assert!(registry.get(&kept).is_some());
    assert!(registry.get(&stale).is_none());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_session_idle_exactly_ttl_is_kept() {
    let (clock, registry) = registry_with(1);
    let (id, _) = registry.open().unwrap();

    clock.advance(DEFAULT_SESSION_TTL);

    assert!(registry.open().is_none());
    assert!(registry.get(&id).is_some());
}

#[test]
fn test_close_forgets_session() {
    let (_clock, registry) = registry_with(1);
    let (id, _) = registry.open().unwrap();

    assert!(registry.close(&id));
    assert!(!registry.close(&id));
    assert!(registry.get(&id).is_none());
    assert!(registry.is_empty());
    assert!(registry.open().is_some());
}

#[tokio::test]
async fn test_attached_store_state_is_restored() {
    let (clock, registry) = registry_with(1);
    let store = Arc::new(InMemorySessionStore::new());
    store.set(IS_ADMIN_KEY, "true".to_string()).await;
    store
        .set(ADMIN_TIMESTAMP_KEY, clock.now().timestamp_millis().to_string())
        .await;

    let (_id, gate) = registry.attach(store).unwrap();

    assert!(gate.restore().await);
}
