//! Outbound link events.
//!
//! [`BleSerial`](super::service::BleSerial) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use crate::config::MAX_DEVICE_NAME_LEN;
use crate::error::RadioError;

/// Structured events emitted by the serial core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    /// The service is registered and the device is broadcasting.
    Started(heapless::String<MAX_DEVICE_NAME_LEN>),

    /// A peer attached since the previous poll.
    PeerAttached,

    /// A peer detached since the previous poll.
    PeerDetached,

    /// Broadcasting restarted after the settle delay.
    Rebroadcast,

    /// Broadcasting could not be restarted; retried on the next poll.
    RebroadcastFailed(RadioError),

    /// The stack was shut down.
    Stopped,

    /// Periodic counters snapshot.
    Stats(LinkStats),
}

/// Running counters for the link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Bytes accepted into the inbound queue.
    pub rx_bytes: u32,
    /// Bytes dropped because the inbound queue was full.
    pub dropped_bytes: u32,
    /// Notifications pushed to the peer.
    pub notifications: u32,
    /// Times broadcasting was restarted after a detach.
    pub reconnects: u32,
}
