//! Application core: pure serial-link logic, zero radio I/O.
//!
//! The UART-style API ([`service::BleSerial`]), its outbound helpers and
//! the events it emits. All interaction with the radio happens through
//! the **port traits** in [`ports`], keeping this layer fully testable
//! without a Bluetooth controller.

pub mod endpoints;
pub mod events;
pub mod notifier;
pub mod ports;
pub mod service;
