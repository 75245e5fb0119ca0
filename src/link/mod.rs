//! Shared link state between the radio stack and the application loop.
//!
//! [`SerialLink`] is the one context object both sides see. The radio
//! adapter holds it as `&'static dyn ConnectionObserver` / `&'static dyn
//! DataSink`; [`BleSerial`](crate::app::service::BleSerial) holds it as
//! `&'static SerialLink<N>`. Everything inside is interior-mutable and
//! interrupt-safe, so no further locking is needed on either side.
//!
//! ```rust
//! use bleserial::link::SerialLink;
//!
//! static LINK: SerialLink<100> = SerialLink::new();
//! ```
//!
//! A link that could never buffer a byte does not build:
//!
//! ```compile_fail
//! use bleserial::link::SerialLink;
//!
//! static LINK: SerialLink<0> = SerialLink::new();
//! ```

pub mod queue;
pub mod state;

use log::{info, warn};

use crate::app::endpoints::Endpoint;
use crate::app::ports::{ConnectionObserver, DataSink};

use queue::InboundByteQueue;
use state::{ConnectionFlag, ConnectionState};

/// Inbound queue plus connection flag, alive for the whole program.
pub struct SerialLink<const N: usize> {
    queue: InboundByteQueue<N>,
    connection: ConnectionFlag,
}

impl<const N: usize> Default for SerialLink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SerialLink<N> {
    pub const fn new() -> Self {
        Self {
            queue: InboundByteQueue::new(),
            connection: ConnectionFlag::new(),
        }
    }

    pub fn queue(&self) -> &InboundByteQueue<N> {
        &self.queue
    }

    pub fn connection(&self) -> &ConnectionFlag {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_attached(&self) -> bool {
        self.state().is_attached()
    }

    /// Data is deliverable only while a peer is attached, whatever is
    /// still buffered from an earlier connection.
    pub fn available(&self) -> bool {
        self.is_attached() && !self.queue.is_empty()
    }
}

impl<const N: usize> ConnectionObserver for SerialLink<N> {
    fn on_attach(&self) {
        self.connection.attach();
        info!("link: peer attached");
    }

    fn on_detach(&self) {
        self.connection.detach();
        info!("link: peer detached");
    }
}

impl<const N: usize> DataSink for SerialLink<N> {
    fn on_bytes(&self, endpoint: Endpoint, bytes: &[u8]) {
        if endpoint != Endpoint::DataIn {
            warn!("link: ignoring {} byte(s) written to {:?}", bytes.len(), endpoint);
            return;
        }
        let accepted = self.queue.push_slice(bytes);
        if accepted < bytes.len() {
            warn!(
                "link: rx queue full, dropped {} of {} byte(s)",
                bytes.len() - accepted,
                bytes.len()
            );
        }
    }
}
