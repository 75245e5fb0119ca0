//! Application service, the UART-style face of the link.
//!
//! [`BleSerial`] owns the radio adapter and the poll-side connection
//! monitor, and borrows the shared [`SerialLink`] for the program's
//! lifetime. Reads are non-blocking pulls from the inbound queue; writes
//! go straight to the data-out endpoint as "set value, then notify".
//!
//! ```text
//!  RadioStack ──callbacks──▶ SerialLink ◀──reads── BleSerial ──▶ EventSink
//!       ▲                                            │
//!       └──────── start_broadcasting / notify ───────┘
//! ```
//!
//! Call [`poll`](BleSerial::poll) from the main loop; it handles the
//! detach → settle → re-broadcast sequence and the loop-test notifier.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{MAX_DEVICE_NAME_LEN, RX_CAPACITY, SerialConfig};
use crate::error::{Error, Result};
use crate::link::SerialLink;
use crate::link::state::{ConnectionMonitor, Transition};

use super::endpoints::{Direction, Endpoint};
use super::events::{LinkStats, SerialEvent};
use super::notifier::{NotifyPacer, TEST_PAYLOAD_LEN, TestPattern};
use super::ports::{ConnectionObserver, EventSink, RadioStack};

// ───────────────────────────────────────────────────────────────
// BleSerial
// ───────────────────────────────────────────────────────────────

pub struct BleSerial<R: RadioStack, const N: usize = RX_CAPACITY> {
    radio: R,
    link: &'static SerialLink<N>,
    monitor: ConnectionMonitor,
    config: SerialConfig,
    pacer: NotifyPacer,
    pattern: TestPattern,
    /// A detach was seen and broadcasting has not been restarted yet.
    rebroadcast_pending: bool,
    /// The settle delay for the pending rebroadcast has been served.
    settled: bool,
    started: bool,
    notifications: u32,
    reconnects: u32,
}

impl<R: RadioStack, const N: usize> BleSerial<R, N> {
    /// Build the service around an adapter and the shared link.
    ///
    /// Fails if the configuration is invalid; the caller must not continue
    /// without a link. A zero-capacity link cannot be constructed at all.
    pub fn new(radio: R, link: &'static SerialLink<N>, config: SerialConfig) -> Result<Self> {
        config.validate()?;
        let pacer = NotifyPacer::new(config.notify_rate_per_sec, config.notify_burst);
        Ok(Self {
            radio,
            link,
            monitor: ConnectionMonitor::new(),
            config,
            pacer,
            pattern: TestPattern::new(),
            rebroadcast_pending: false,
            settled: false,
            started: false,
            notifications: 0,
            reconnects: 0,
        })
    }

    /// Bring the stack up, register the three endpoints and start
    /// broadcasting under `identity`.
    pub fn begin(&mut self, identity: &str, events: &mut impl EventSink) -> Result<()> {
        if self.started {
            warn!("BLESerial: begin called twice, ignoring");
            return Ok(());
        }
        let mut name = heapless::String::<MAX_DEVICE_NAME_LEN>::new();
        name.push_str(identity)
            .map_err(|_| Error::Config("device name longer than 24 bytes"))?;
        if name.is_empty() {
            return Err(Error::Config("device name is empty"));
        }

        self.radio.init(identity)?;
        self.radio.create_service(Endpoint::Service)?;
        self.radio
            .create_endpoint(Endpoint::Service, Endpoint::DataOut, Direction::Notifiable)?;
        self.radio
            .create_endpoint(Endpoint::Service, Endpoint::DataIn, Direction::WritableByPeer)?;
        self.radio.register_connection_callbacks(self.link);
        self.radio.register_write_callback(Endpoint::DataIn, self.link);
        self.radio.start_service()?;
        self.radio.start_broadcasting()?;

        self.config.device_name = name.clone();
        self.started = true;
        info!("BLESerial: init complete, advertising as '{}'", identity);
        events.emit(&SerialEvent::Started(name));
        Ok(())
    }

    /// One cooperative step. Detects attach/detach edges, restarts
    /// broadcasting after a detach (blocking for the settle delay), and
    /// sends a test notification when loop-test mode is on.
    pub fn poll(&mut self, delay: &mut impl DelayNs, events: &mut impl EventSink) {
        if !self.started {
            return;
        }

        if self.config.loop_test && self.link.is_attached() {
            match self.send_test() {
                Ok(()) | Err(Error::Congested) => {}
                Err(e) => warn!("BLESerial: loop test send failed: {}", e),
            }
        }

        match self.monitor.poll(self.link.connection()) {
            Some(Transition::JustDetached) => {
                events.emit(&SerialEvent::PeerDetached);
                self.rebroadcast_pending = true;
                self.settled = false;
            }
            Some(Transition::JustAttached) => {
                info!("BLESerial: peer attached");
                self.rebroadcast_pending = false;
                events.emit(&SerialEvent::PeerAttached);
            }
            None => {}
        }

        if self.rebroadcast_pending && !self.link.is_attached() {
            self.rebroadcast(delay, events);
        }
    }

    /// Settle once per detach, then try to advertise. Failed attempts are
    /// retried on later polls without pausing again.
    fn rebroadcast(&mut self, delay: &mut impl DelayNs, events: &mut impl EventSink) {
        if !self.settled {
            delay.delay_ms(self.config.settle_delay_ms);
            self.settled = true;
        }
        match self.radio.start_broadcasting() {
            Ok(()) => {
                self.rebroadcast_pending = false;
                self.reconnects = self.reconnects.wrapping_add(1);
                info!("BLESerial: start advertising");
                events.emit(&SerialEvent::Rebroadcast);
            }
            Err(e) => {
                warn!("BLESerial: advertising restart failed ({}), will retry", e);
                events.emit(&SerialEvent::RebroadcastFailed(e));
            }
        }
    }

    // ── Inbound ───────────────────────────────────────────────

    /// True iff a peer is attached and at least one byte is queued.
    pub fn has_data(&self) -> bool {
        self.link.available()
    }

    /// Non-blocking best-effort line read; see
    /// [`InboundByteQueue::read_line`](crate::link::queue::InboundByteQueue::read_line).
    pub fn read_line(&self, delimiter: u8) -> heapless::Vec<u8, N> {
        self.link.queue().read_line(delimiter)
    }

    /// [`read_line`](Self::read_line) with the configured delimiter.
    pub fn read_configured_line(&self) -> heapless::Vec<u8, N> {
        self.read_line(self.config.line_delimiter)
    }

    /// Next queued byte, gated on the connection like [`has_data`](Self::has_data).
    pub fn read_byte(&self) -> Option<u8> {
        if !self.link.is_attached() {
            return None;
        }
        self.link.queue().pop()
    }

    /// Discard all queued inbound bytes.
    pub fn flush(&self) {
        self.link.queue().flush();
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Send `bytes` as one notification on the data-out endpoint.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.admit(bytes.len())?;
        self.push_out(bytes)
    }

    /// Split `bytes` into notification-sized chunks and send as many as
    /// pacing allows. Returns the number of bytes sent; fails only when
    /// nothing could be sent.
    pub fn write_chunked(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut sent = 0;
        for chunk in bytes.chunks(self.config.max_payload_len) {
            match self.write(chunk) {
                Ok(()) => sent += chunk.len(),
                Err(Error::Congested) if sent > 0 => break,
                Err(e) => return Err(e),
            }
        }
        Ok(sent)
    }

    /// Send the next `testN\n` payload.
    pub fn send_test(&mut self) -> Result<()> {
        self.admit(TEST_PAYLOAD_LEN)?;
        let payload = self.pattern.next_payload();
        self.push_out(&payload)
    }

    fn admit(&mut self, len: usize) -> Result<()> {
        if !self.started || !self.link.is_attached() {
            return Err(Error::NotConnected);
        }
        if len > self.config.max_payload_len {
            return Err(Error::PayloadTooLarge);
        }
        if !self.pacer.try_acquire() {
            return Err(Error::Congested);
        }
        Ok(())
    }

    fn push_out(&mut self, bytes: &[u8]) -> Result<()> {
        self.radio.set_endpoint_value(Endpoint::DataOut, bytes)?;
        self.radio.notify(Endpoint::DataOut)?;
        self.notifications = self.notifications.wrapping_add(1);
        Ok(())
    }

    // ── Control ───────────────────────────────────────────────

    /// Stop broadcasting and shut the stack down. An attached peer is
    /// dropped with the stack; queued bytes are kept for a later `begin`.
    pub fn end(&mut self, events: &mut impl EventSink) {
        if !self.started {
            return;
        }
        self.radio.shutdown();
        if self.link.is_attached() {
            self.link.on_detach();
        }
        // Absorb the detach so a later `begin` starts from a clean edge.
        let _ = self.monitor.poll(self.link.connection());
        self.started = false;
        self.rebroadcast_pending = false;
        info!("BLESerial: stopped");
        events.emit(&SerialEvent::Stopped);
    }

    pub fn set_loop_test(&mut self, enabled: bool) {
        self.config.loop_test = enabled;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_attached()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            rx_bytes: self.link.queue().accepted(),
            dropped_bytes: self.link.queue().dropped(),
            notifications: self.notifications,
            reconnects: self.reconnects,
        }
    }

    /// Emit a [`SerialEvent::Stats`] snapshot.
    pub fn report_stats(&self, events: &mut impl EventSink) {
        events.emit(&SerialEvent::Stats(self.stats()));
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}
