use super::*;

fn policy(attempts: u32, delay: u64, delay_max: u64) -> ReconnectPolicy {
    ReconnectPolicy::from(&ChannelConfig {
        reconnection: true,
        reconnection_attempts: attempts,
        reconnection_delay: delay,
        reconnection_delay_max: delay_max,
    })
}

// =============================================================
// Reconnect policy
// =============================================================

#[test]
fn default_config_doubles_until_cap() {
    let p = ReconnectPolicy::from(&ChannelConfig::default());
    let delays: Vec<_> = (1..=5).map(|n| p.delay_for(n).expect("delay").as_millis()).collect();
    assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
    assert_eq!(p.delay_for(6), None);
}

#[test]
fn disabled_reconnection_never_retries() {
    let p = ReconnectPolicy::from(&ChannelConfig { reconnection: false, ..ChannelConfig::default() });
    assert_eq!(p.delay_for(1), None);
}

#[test]
fn zero_attempts_never_retries() {
    assert_eq!(policy(0, 1_000, 5_000).delay_for(1), None);
}

#[test]
fn attempt_zero_has_no_delay() {
    assert_eq!(policy(5, 1_000, 5_000).delay_for(0), None);
}

#[test]
fn delay_max_below_delay_is_raised() {
    let p = policy(3, 2_000, 500);
    assert_eq!(p.delay_max, Duration::from_millis(2_000));
    assert_eq!(p.delay_for(3), Some(Duration::from_millis(2_000)));
}

#[test]
fn large_attempt_counts_saturate() {
    let p = policy(u32::MAX, 1_000, 30_000);
    assert_eq!(p.delay_for(64), Some(Duration::from_millis(30_000)));
}

// =============================================================
// URLs
// =============================================================

#[test]
fn channel_url_follows_page_scheme() {
    assert_eq!(channel_url("http:", "localhost:3000"), "ws://localhost:3000/ws");
    assert_eq!(channel_url("https:", "motion.example"), "wss://motion.example/ws");
}

// =============================================================
// Outbound queue
// =============================================================

#[test]
fn stale_outbound_messages_are_discarded() {
    let mut queued = vec![r#"{"event":"pause_streaming"}"#.to_owned(), r#"{"event":"stop_streaming"}"#.to_owned()]
        .into_iter();
    assert_eq!(discard_stale(|| queued.next()), 2);
    assert_eq!(queued.next(), None);
}

#[test]
fn empty_queue_discards_nothing() {
    assert_eq!(discard_stale(|| None), 0);
}
