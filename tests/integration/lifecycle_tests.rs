//! Integration tests for the connection lifecycle: detach detection,
//! the settle pause and advertising restarts.

use bleserial::app::events::SerialEvent;
use bleserial::config::SerialConfig;
use bleserial::error::{Error, RadioError};

use crate::mock_radio::{MockDelay, RadioCall, roomy_config, started_serial};

fn is_rebroadcast(e: &SerialEvent) -> bool {
    matches!(e, SerialEvent::Rebroadcast)
}

#[test]
fn idle_polls_never_rebroadcast() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    for _ in 0..20 {
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(serial.radio().broadcast_attempts(), 1, "only the initial broadcast");
    assert!(delay.ms_calls.is_empty());
}

#[test]
fn connected_polls_never_rebroadcast() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();
    serial.radio().peer_connect();

    for _ in 0..20 {
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(serial.radio().broadcast_attempts(), 1);
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::PeerAttached)), 1);
}

#[test]
fn disconnect_rebroadcasts_exactly_once_after_settle() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);

    assert_eq!(delay.ms_calls, [500]);
    assert_eq!(serial.radio().broadcast_attempts(), 2);
    assert_eq!(serial.radio().calls.last(), Some(&RadioCall::StartBroadcasting));

    for _ in 0..10 {
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(serial.radio().broadcast_attempts(), 2);
    assert_eq!(sink.count(is_rebroadcast), 1);
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::PeerDetached)), 1);
}

#[test]
fn every_connection_cycle_rebroadcasts() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    for _ in 0..3 {
        serial.radio().peer_connect();
        serial.poll(&mut delay, &mut sink);
        serial.radio().peer_disconnect();
        serial.poll(&mut delay, &mut sink);
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(serial.radio().broadcast_attempts(), 4);
    assert_eq!(sink.count(is_rebroadcast), 3);
    assert_eq!(serial.stats().reconnects, 3);
}

#[test]
fn connect_and_disconnect_between_polls_still_rebroadcasts() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);
    serial.poll(&mut delay, &mut sink);

    assert_eq!(serial.radio().broadcast_attempts(), 2);
    assert_eq!(sink.count(is_rebroadcast), 1);
}

#[test]
fn settle_delay_follows_config() {
    let config = SerialConfig {
        settle_delay_ms: 250,
        ..roomy_config()
    };
    let (mut serial, mut sink) = started_serial::<100>(config);
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);

    assert_eq!(delay.ms_calls, [250]);
}

#[test]
fn failed_rebroadcast_is_retried_on_next_poll() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio_mut().fail_broadcasts = 1;
    serial.radio().peer_disconnect();

    serial.poll(&mut delay, &mut sink);
    assert!(sink.events.contains(&SerialEvent::RebroadcastFailed(
        RadioError::BroadcastFailed
    )));
    assert_eq!(sink.count(is_rebroadcast), 0);

    serial.poll(&mut delay, &mut sink);
    assert_eq!(sink.count(is_rebroadcast), 1);
    assert_eq!(serial.radio().broadcast_attempts(), 3);
    assert_eq!(delay.ms_calls, [500]);

    serial.poll(&mut delay, &mut sink);
    assert_eq!(serial.radio().broadcast_attempts(), 3);
}

#[test]
fn repeated_failures_settle_only_once() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio_mut().fail_broadcasts = 5;
    serial.radio().peer_disconnect();

    for _ in 0..10 {
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(delay.ms_calls, [500], "retries must not stall the loop again");
    assert_eq!(serial.radio().broadcast_attempts(), 1 + 6);
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::RebroadcastFailed(_))), 5);
    assert_eq!(sink.count(is_rebroadcast), 1);

    // The next detach gets its own settle pause.
    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);
    assert_eq!(delay.ms_calls, [500, 500]);
}

#[test]
fn reconnect_cancels_pending_retry() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio_mut().fail_broadcasts = 1;
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);

    serial.radio().peer_connect();
    for _ in 0..5 {
        serial.poll(&mut delay, &mut sink);
    }
    assert_eq!(serial.radio().broadcast_attempts(), 2);
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::PeerAttached)), 2);
}

#[test]
fn queued_bytes_survive_detach_but_stay_hidden() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();

    serial.radio().peer_connect();
    serial.radio().peer_write(b"left\n");
    serial.radio().peer_disconnect();
    serial.poll(&mut delay, &mut sink);
    assert!(!serial.has_data());

    serial.radio().peer_connect();
    assert!(serial.has_data());
    assert_eq!(serial.read_line(b'\n').as_slice(), b"left");
}

#[test]
fn end_shuts_down_and_stops_polling() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();
    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);

    serial.end(&mut sink);
    assert_eq!(serial.radio().calls.last(), Some(&RadioCall::Shutdown));
    assert_eq!(sink.events.last(), Some(&SerialEvent::Stopped));
    assert!(!serial.is_started());
    assert_eq!(serial.write(b"x"), Err(Error::NotConnected));

    let calls = serial.radio().calls.len();
    serial.poll(&mut delay, &mut sink);
    assert_eq!(serial.radio().calls.len(), calls);

    serial.end(&mut sink);
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::Stopped)), 1);
}

#[test]
fn end_drops_the_attached_peer() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();
    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.radio().peer_write(b"x");

    serial.end(&mut sink);
    assert!(!serial.is_connected());
    assert!(!serial.has_data());
    assert_eq!(serial.read_byte(), None);
}

#[test]
fn restart_after_end_sees_fresh_connection_edges() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let mut delay = MockDelay::default();
    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    serial.end(&mut sink);

    serial.begin("dev", &mut sink).unwrap();
    let attempts = serial.radio().broadcast_attempts();
    serial.poll(&mut delay, &mut sink);
    assert_eq!(serial.radio().broadcast_attempts(), attempts, "no stale rebroadcast");
    assert!(delay.ms_calls.is_empty());

    serial.radio().peer_connect();
    serial.poll(&mut delay, &mut sink);
    assert_eq!(sink.events.last(), Some(&SerialEvent::PeerAttached));
    assert_eq!(sink.count(|e| matches!(e, SerialEvent::PeerAttached)), 2);
}

#[test]
fn stats_are_reported_as_an_event() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    serial.radio().peer_write(b"abc");
    serial.write(b"ok").unwrap();

    serial.report_stats(&mut sink);
    let Some(SerialEvent::Stats(stats)) = sink.events.last() else {
        panic!("expected a stats event");
    };
    assert_eq!(stats.rx_bytes, 3);
    assert_eq!(stats.dropped_bytes, 0);
    assert_eq!(stats.notifications, 1);
    assert_eq!(stats.reconnects, 0);
}
