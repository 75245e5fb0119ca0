//! Unified error types for the BLE serial link.
//!
//! A single `Error` enum that every layer converts into, keeping the
//! application loop's error handling uniform. All variants are `Copy` so
//! they can be returned from the poll path without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Construction or bring-up failed; the link must not be used.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
    /// Persistent storage could not be read or written.
    Storage(&'static str),
    /// The radio stack rejected an operation.
    Radio(RadioError),
    /// No peer is attached, so nothing can be sent.
    NotConnected,
    /// Outbound notification budget exhausted; retry on a later poll.
    Congested,
    /// Payload does not fit in a single notification.
    PayloadTooLarge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::NotConnected => write!(f, "no peer attached"),
            Self::Congested => write!(f, "notification rate exceeded"),
            Self::PayloadTooLarge => write!(f, "payload exceeds notification size"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Radio stack errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`RadioStack`](crate::app::ports::RadioStack)
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Controller or host stack failed to come up.
    StackInitFailed,
    /// Service or endpoint registration was refused.
    RegistrationFailed,
    /// Advertising could not be started.
    BroadcastFailed,
    /// Setting a value or sending a notification failed.
    NotifyFailed,
    /// Operation attempted before `init`.
    NotInitialised,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInitFailed => write!(f, "stack init failed"),
            Self::RegistrationFailed => write!(f, "GATT registration failed"),
            Self::BroadcastFailed => write!(f, "advertising start failed"),
            Self::NotifyFailed => write!(f, "notification failed"),
            Self::NotInitialised => write!(f, "stack not initialised"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
