use super::*;

#[test]
fn default_policy_is_five_attempts_three_seconds() {
    let policy = ReconnectPolicy::default();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay, Duration::from_secs(3));
}

#[test]
fn counter_increases_monotonically_then_stops_at_cap() {
    let mut counter = ReconnectCounter::new(5);
    let claimed: Vec<u32> = std::iter::from_fn(|| counter.next_attempt()).collect();
    assert_eq!(claimed, vec![1, 2, 3, 4, 5]);
    assert!(counter.is_exhausted());
    assert_eq!(counter.next_attempt(), None);
    assert_eq!(counter.attempts(), 5);
}

#[test]
fn counter_reset_reopens_slots() {
    let mut counter = ReconnectCounter::new(2);
    assert_eq!(counter.next_attempt(), Some(1));
    assert_eq!(counter.next_attempt(), Some(2));
    assert_eq!(counter.next_attempt(), None);

    counter.reset();
    assert_eq!(counter.attempts(), 0);
    assert!(!counter.is_exhausted());
    assert_eq!(counter.next_attempt(), Some(1));
}

#[test]
fn zero_cap_never_grants_a_retry() {
    let mut counter = ReconnectCounter::new(0);
    assert!(counter.is_exhausted());
    assert_eq!(counter.next_attempt(), None);
    assert_eq!(counter.cap(), 0);
}

#[test]
fn connection_state_defaults_to_disconnected() {
    assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    assert_eq!(
        serde_json::to_value(ConnectionState::Connecting).expect("serialize"),
        serde_json::json!("connecting")
    );
}
