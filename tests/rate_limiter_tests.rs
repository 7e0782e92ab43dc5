use chrono::DateTime;
use media_portal::{
    clock::{Clock, ClockState, ManualClock},
    rate_limiter::RateLimiter,
};
use std::{sync::Arc, time::Duration};

// --- Test Utilities ---

const WINDOW: Duration = Duration::from_secs(15 * 60);

fn fixed_clock() -> Arc<ManualClock> {
    // 2025-01-01T00:00:00Z
    Arc::new(ManualClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap()))
}

fn limiter_with(clock: &Arc<ManualClock>) -> RateLimiter {
    RateLimiter::new(5, WINDOW, clock.clone() as ClockState)
}

// --- Tests ---

#[test]
fn test_sixth_attempt_in_window_is_denied() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    let results: Vec<bool> = (0..5).map(|_| limiter.is_allowed("k")).collect();
    assert_eq!(results, vec![true, true, true, true, true]);

    assert!(!limiter.is_allowed("k"));
    // Every further call in the same window stays denied.
    assert!(!limiter.is_allowed("k"));
}

#[test]
fn test_denial_does_not_increment_count() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    for _ in 0..8 {
        limiter.is_allowed("k");
    }

    let record = limiter.snapshot("k").expect("window should be open");
    assert_eq!(record.count, 5);
}

#[test]
fn test_reset_clears_exhausted_key() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    for _ in 0..6 {
        limiter.is_allowed("k");
    }
    assert!(!limiter.is_allowed("k"));

    limiter.reset("k");
    assert!(limiter.snapshot("k").is_none());
    assert!(limiter.is_allowed("k"));
    assert_eq!(limiter.snapshot("k").unwrap().count, 1);
}

#[test]
fn test_window_elapsed_starts_fresh_window() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    for _ in 0..5 {
        assert!(limiter.is_allowed("k"));
    }
    assert!(!limiter.is_allowed("k"));

    clock.advance(WINDOW + Duration::from_secs(1));

    assert!(limiter.is_allowed("k"));
    let record = limiter.snapshot("k").unwrap();
    assert_eq!(record.count, 1);
    assert_eq!(record.window_start, clock.now());
}

#[test]
fn test_window_boundary_is_inclusive() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    for _ in 0..5 {
        limiter.is_allowed("k");
    }

    // Exactly one window later the old window still applies.
    clock.advance(WINDOW);
    assert!(!limiter.is_allowed("k"));

    clock.advance(Duration::from_millis(1));
    assert!(limiter.is_allowed("k"));
}

#[test]
fn test_window_is_measured_from_first_attempt() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    assert!(limiter.is_allowed("k"));
    clock.advance(Duration::from_secs(10 * 60));
    for _ in 0..4 {
        assert!(limiter.is_allowed("k"));
    }
    assert!(!limiter.is_allowed("k"));

    // 16 minutes after the first attempt, only 6 after the last one.
    clock.advance(Duration::from_secs(6 * 60));
    assert!(limiter.is_allowed("k"));
}

#[test]
fn test_keys_are_independent() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    for _ in 0..6 {
        limiter.is_allowed("a");
    }
    assert!(!limiter.is_allowed("a"));
    assert!(limiter.is_allowed("b"));
}

#[test]
fn test_zero_max_attempts_still_allows_first_call() {
    let clock = fixed_clock();
    let limiter = RateLimiter::new(0, WINDOW, clock.clone() as ClockState);

    assert_eq!(limiter.max_attempts(), 1);
    assert!(limiter.is_allowed("k"));
    assert!(!limiter.is_allowed("k"));
}

#[test]
fn test_snapshot_hides_elapsed_window() {
    let clock = fixed_clock();
    let limiter = limiter_with(&clock);

    limiter.is_allowed("k");
    assert!(limiter.snapshot("k").is_some());

    clock.advance(WINDOW + Duration::from_secs(1));
    assert!(limiter.snapshot("k").is_none());
}

#[test]
fn test_defaults() {
    let limiter = RateLimiter::with_defaults(fixed_clock() as ClockState);
    assert_eq!(limiter.max_attempts(), 5);
    assert_eq!(limiter.window().num_minutes(), 15);
}

