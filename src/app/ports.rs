//! Port traits: the hexagonal boundary between the serial core and the radio.
//!
//! ```text
//!   RadioStack ──callbacks──▶ ConnectionObserver / DataSink (SerialLink)
//!   BleSerial  ──commands───▶ RadioStack
//!   BleSerial  ──events─────▶ EventSink
//!   main       ──load/save──▶ ConfigPort
//! ```
//!
//! The radio adapter drives the two callback capabilities from its own
//! execution context (Bluedroid task, interrupt, test thread). Both take
//! `&self` and are `Sync`, so the implementor must be safe to call
//! concurrently with the application loop.

use crate::config::SerialConfig;
use crate::error::{self, RadioError};

use super::endpoints::{Direction, Endpoint};
use super::events::SerialEvent;

// ───────────────────────────────────────────────────────────────
// Callback capabilities (driven by the radio stack)
// ───────────────────────────────────────────────────────────────

/// Peer attach/detach notifications.
pub trait ConnectionObserver: Sync {
    fn on_attach(&self);
    fn on_detach(&self);
}

/// Payload delivery for peer-writable endpoints.
pub trait DataSink: Sync {
    /// Called once per peer write, with the bytes in payload order.
    fn on_bytes(&self, endpoint: Endpoint, bytes: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Radio stack port (driven adapter: core → radio)
// ───────────────────────────────────────────────────────────────

/// The external radio stack as seen by the serial core.
///
/// Registration is declarative: the core describes the service and its
/// endpoints, then starts it. How the stack sequences that internally
/// is the adapter's business.
pub trait RadioStack {
    /// One-time stack bring-up under the given advertised identity.
    fn init(&mut self, identity: &str) -> Result<(), RadioError>;

    /// Declare the service that will own the endpoints.
    fn create_service(&mut self, service: Endpoint) -> Result<(), RadioError>;

    /// Declare one endpoint of `service`.
    fn create_endpoint(
        &mut self,
        service: Endpoint,
        endpoint: Endpoint,
        direction: Direction,
    ) -> Result<(), RadioError>;

    /// Route attach/detach events to `observer`.
    fn register_connection_callbacks(&mut self, observer: &'static dyn ConnectionObserver);

    /// Route peer writes on `endpoint` to `sink`.
    fn register_write_callback(&mut self, endpoint: Endpoint, sink: &'static dyn DataSink);

    /// Publish the declared service.
    fn start_service(&mut self) -> Result<(), RadioError>;

    /// Make the device discoverable so a peer can attach.
    fn start_broadcasting(&mut self) -> Result<(), RadioError>;

    /// Replace the current value of `endpoint`.
    fn set_endpoint_value(&mut self, endpoint: Endpoint, bytes: &[u8]) -> Result<(), RadioError>;

    /// Push the current value of `endpoint` to the attached peer.
    fn notify(&mut self, endpoint: Endpoint) -> Result<(), RadioError>;

    /// Stop broadcasting and release the stack.
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`SerialEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &SerialEvent);
}

// ───────────────────────────────────────────────────────────────
// Config port (driven adapter: core ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent home of the [`SerialConfig`].
pub trait ConfigPort {
    /// Load the stored config, or defaults when none was ever saved.
    fn load(&self) -> error::Result<SerialConfig>;

    /// Validate and persist `config`.
    fn save(&self, config: &SerialConfig) -> error::Result<()>;
}
