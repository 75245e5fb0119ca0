//! BLE serial firmware library.
//!
//! A UART-style byte stream carried over a Nordic UART Service. Exposes
//! the pure-logic modules for integration testing; all ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod link;

pub mod adapters;

mod esp_link_shims;
