//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing link events to the ESP-IDF logger
//! (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::SerialEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SerialEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SerialEvent) {
        match event {
            SerialEvent::Started(name) => info!("LINK | started, advertising as '{}'", name),
            SerialEvent::PeerAttached => info!("LINK | peer attached"),
            SerialEvent::PeerDetached => info!("LINK | peer detached"),
            SerialEvent::Rebroadcast => info!("LINK | advertising restarted"),
            SerialEvent::RebroadcastFailed(e) => warn!("LINK | advertising restart failed: {}", e),
            SerialEvent::Stopped => info!("LINK | stopped"),
            SerialEvent::Stats(s) => info!(
                "LINK | rx={}B dropped={}B notify={} reconnects={}",
                s.rx_bytes, s.dropped_bytes, s.notifications, s.reconnects
            ),
        }
    }
}
