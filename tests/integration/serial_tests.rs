//! Integration tests for the UART-style surface: startup registration,
//! inbound reads and outbound notifications.

use bleserial::app::endpoints::{Direction, Endpoint};
use bleserial::app::events::SerialEvent;
use bleserial::app::service::BleSerial;
use bleserial::config::SerialConfig;
use bleserial::error::Error;

use crate::mock_radio::{
    MockDelay, MockRadio, RadioCall, RecordingSink, leak_link, roomy_config, started_serial,
};

// ── Startup ───────────────────────────────────────────────────

#[test]
fn begin_registers_service_then_broadcasts() {
    let (serial, sink) = started_serial::<100>(roomy_config());

    assert_eq!(
        serial.radio().calls,
        vec![
            RadioCall::Init("dev".into()),
            RadioCall::CreateService(Endpoint::Service),
            RadioCall::CreateEndpoint(Endpoint::Service, Endpoint::DataOut, Direction::Notifiable),
            RadioCall::CreateEndpoint(Endpoint::Service, Endpoint::DataIn, Direction::WritableByPeer),
            RadioCall::RegisterObserver,
            RadioCall::RegisterSink(Endpoint::DataIn),
            RadioCall::StartService,
            RadioCall::StartBroadcasting,
        ]
    );
    assert!(matches!(
        sink.events.as_slice(),
        [SerialEvent::Started(name)] if name.as_str() == "dev"
    ));
    assert!(serial.is_started());
    assert!(!serial.is_connected());
    assert_eq!(serial.config().device_name.as_str(), "dev");
}

#[test]
fn begin_twice_is_ignored() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    let calls_before = serial.radio().calls.len();

    serial.begin("other", &mut sink).unwrap();
    assert_eq!(serial.radio().calls.len(), calls_before);
    assert_eq!(sink.events.len(), 1);
}

#[test]
fn begin_rejects_bad_names_without_touching_radio() {
    let mut serial = BleSerial::<_, 100>::new(MockRadio::new(), leak_link(), roomy_config()).unwrap();
    let mut sink = RecordingSink::new();

    assert!(matches!(serial.begin("", &mut sink), Err(Error::Config(_))));
    assert!(matches!(
        serial.begin("a-name-that-is-far-too-long-for-gap", &mut sink),
        Err(Error::Config(_))
    ));
    assert!(serial.radio().calls.is_empty());
    assert!(!serial.is_started());
}

#[test]
fn invalid_config_fails_construction() {
    let config = SerialConfig {
        notify_rate_per_sec: 0,
        ..roomy_config()
    };
    let result = BleSerial::<_, 100>::new(MockRadio::new(), leak_link(), config);
    assert!(matches!(result, Err(Error::Config(_))));

    let config = SerialConfig {
        max_payload_len: 0,
        ..roomy_config()
    };
    let result = BleSerial::<_, 100>::new(MockRadio::new(), leak_link(), config);
    assert!(matches!(result, Err(Error::Config(_))));
}

// ── Inbound ───────────────────────────────────────────────────

#[test]
fn data_is_hidden_until_a_peer_is_attached() {
    let (serial, _sink) = started_serial::<100>(roomy_config());

    serial.radio().peer_write(b"ab");
    assert!(!serial.has_data(), "no data may be reported while detached");
    assert_eq!(serial.read_byte(), None);

    serial.radio().peer_connect();
    assert!(serial.has_data());
    assert_eq!(serial.read_byte(), Some(b'a'));
}

#[test]
fn read_line_splits_on_delimiter_and_returns_partials() {
    let (serial, _sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    serial.radio().peer_write(b"hello\nworld");

    assert_eq!(serial.read_line(b'\n').as_slice(), b"hello");
    assert!(serial.has_data());
    assert_eq!(serial.read_line(b'\n').as_slice(), b"world");
    assert!(!serial.has_data());
    assert!(serial.read_line(b'\n').is_empty());
}

#[test]
fn configured_delimiter_is_used() {
    let config = SerialConfig {
        line_delimiter: b';',
        ..roomy_config()
    };
    let (serial, _sink) = started_serial::<100>(config);
    serial.radio().peer_connect();
    serial.radio().peer_write(b"a;b;");

    assert_eq!(serial.read_configured_line().as_slice(), b"a");
    assert_eq!(serial.read_configured_line().as_slice(), b"b");
    assert!(!serial.has_data());
}

#[test]
fn writes_split_across_packets_join_into_one_line() {
    let (serial, _sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    serial.radio().peer_write(b"hel");
    serial.radio().peer_write(b"lo\n");

    assert_eq!(serial.read_line(b'\n').as_slice(), b"hello");
}

#[test]
fn full_queue_drops_and_counts_overflow() {
    let (serial, _sink) = started_serial::<4>(roomy_config());
    serial.radio().peer_connect();
    serial.radio().peer_write(b"0123456789");

    let stats = serial.stats();
    assert_eq!(stats.rx_bytes, 4);
    assert_eq!(stats.dropped_bytes, 6);
    assert_eq!(serial.read_line(b'\n').as_slice(), b"0123");
}

#[test]
fn flush_discards_everything() {
    let (serial, _sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    serial.radio().peer_write(b"junk\nmore");

    serial.flush();
    assert!(!serial.has_data());
    serial.flush();
    assert!(!serial.has_data());
}

// ── Outbound ──────────────────────────────────────────────────

#[test]
fn write_requires_attached_peer() {
    let (mut serial, _sink) = started_serial::<100>(roomy_config());
    assert_eq!(serial.write(b"hi"), Err(Error::NotConnected));
    assert!(serial.radio().sent.is_empty());

    serial.radio().peer_connect();
    serial.write(b"hi").unwrap();

    let tail = &serial.radio().calls[serial.radio().calls.len() - 2..];
    assert_eq!(
        tail,
        [
            RadioCall::SetValue(Endpoint::DataOut, b"hi".to_vec()),
            RadioCall::Notify(Endpoint::DataOut),
        ]
    );
    assert_eq!(serial.stats().notifications, 1);
}

#[test]
fn write_before_begin_is_rejected() {
    let mut serial = BleSerial::<_, 100>::new(MockRadio::new(), leak_link(), roomy_config()).unwrap();
    assert_eq!(serial.write(b"x"), Err(Error::NotConnected));
}

#[test]
fn oversized_payload_is_rejected() {
    let (mut serial, _sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    let big = [b'x'; 21];
    assert_eq!(serial.write(&big), Err(Error::PayloadTooLarge));
    assert!(serial.radio().sent.is_empty());
}

#[test]
fn pacing_reports_congestion() {
    let config = SerialConfig {
        notify_rate_per_sec: 1,
        notify_burst: 2,
        ..SerialConfig::default()
    };
    let (mut serial, _sink) = started_serial::<100>(config);
    serial.radio().peer_connect();

    assert!(serial.write(b"a").is_ok(), "a fresh pacer admits a write");
    let results: Vec<_> = (0..10).map(|_| serial.write(b"b")).collect();
    assert!(results.contains(&Err(Error::Congested)));
    assert!(results.iter().all(|r| matches!(r, Ok(()) | Err(Error::Congested))));
}

#[test]
fn write_chunked_splits_at_payload_limit() {
    let (mut serial, _sink) = started_serial::<100>(roomy_config());
    serial.radio().peer_connect();
    let data: Vec<u8> = (0..45u8).collect();

    assert_eq!(serial.write_chunked(&data), Ok(45));
    let sizes: Vec<usize> = serial.radio().sent.iter().map(Vec::len).collect();
    assert_eq!(sizes, [20, 20, 5]);
    assert_eq!(serial.radio().sent.concat(), data);
}

#[test]
fn write_chunked_stops_at_congestion() {
    let config = SerialConfig {
        notify_rate_per_sec: 1,
        notify_burst: 2,
        ..SerialConfig::default()
    };
    let (mut serial, _sink) = started_serial::<100>(config);
    serial.radio().peer_connect();

    let sent = serial.write_chunked(&[b'z'; 200]).unwrap();
    assert!(sent > 0 && sent < 200);
    assert_eq!(sent % 20, 0);
}

// ── Loop test ─────────────────────────────────────────────────

#[test]
fn loop_test_counts_zero_to_nine_and_wraps() {
    let config = SerialConfig {
        loop_test: true,
        ..roomy_config()
    };
    let (mut serial, mut sink) = started_serial::<100>(config);
    let mut delay = MockDelay::default();
    serial.radio().peer_connect();

    for _ in 0..12 {
        serial.poll(&mut delay, &mut sink);
    }

    let sent = &serial.radio().sent;
    assert_eq!(sent.len(), 12);
    assert_eq!(sent[0], b"test0\n");
    assert_eq!(sent[9], b"test9\n");
    assert_eq!(sent[10], b"test0\n");
    assert_eq!(sent[11], b"test1\n");
}

#[test]
fn loop_test_is_silent_while_detached() {
    let (mut serial, mut sink) = started_serial::<100>(roomy_config());
    serial.set_loop_test(true);
    let mut delay = MockDelay::default();

    for _ in 0..5 {
        serial.poll(&mut delay, &mut sink);
    }
    assert!(serial.radio().sent.is_empty());
}
