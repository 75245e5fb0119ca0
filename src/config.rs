//! Link configuration parameters
//!
//! All tunable parameters for the BLE serial link. The inbound queue
//! capacity is a const generic on the link itself; everything else lives
//! here and can be persisted as a postcard blob.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default inbound queue capacity in bytes.
pub const RX_CAPACITY: usize = 100;

/// Longest advertised device name accepted by the GAP layer.
pub const MAX_DEVICE_NAME_LEN: usize = 24;

/// Core link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    // --- Identity ---
    /// Name the device advertises under
    pub device_name: heapless::String<MAX_DEVICE_NAME_LEN>,

    // --- Lifecycle ---
    /// Pause after a disconnect before advertising again (milliseconds)
    pub settle_delay_ms: u32,

    // --- Outbound ---
    /// Sustained notification rate (notifications per second)
    pub notify_rate_per_sec: u64,
    /// Notifications allowed back-to-back before pacing kicks in
    pub notify_burst: u64,
    /// Largest payload sent in a single notification (bytes)
    pub max_payload_len: usize,
    /// Emit `testN\n` notifications while a peer is attached
    pub loop_test: bool,

    // --- Inbound ---
    /// Byte terminating a line for [`read_line`](crate::app::service::BleSerial::read_line)
    pub line_delimiter: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str("BLESerial");
        Self {
            device_name,

            // Lifecycle
            settle_delay_ms: 500,

            // Outbound
            notify_rate_per_sec: 100, // one per 10 ms
            notify_burst: 10,
            max_payload_len: 20, // ATT payload at the default 23-byte MTU
            loop_test: false,

            // Inbound
            line_delimiter: b'\n',
        }
    }
}

impl SerialConfig {
    /// Config with defaults and the given advertised name.
    pub fn with_name(name: &str) -> Result<Self> {
        let mut device_name = heapless::String::new();
        device_name
            .push_str(name)
            .map_err(|_| Error::Config("device name longer than 24 bytes"))?;
        let config = Self {
            device_name,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the link cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() {
            return Err(Error::Config("device name is empty"));
        }
        if self.notify_rate_per_sec == 0 {
            return Err(Error::Config("notify rate must be non-zero"));
        }
        if self.notify_burst == 0 {
            return Err(Error::Config("notify burst must be non-zero"));
        }
        if self.max_payload_len == 0 {
            return Err(Error::Config("max payload length must be non-zero"));
        }
        Ok(())
    }

    /// Encode as a compact blob for non-volatile storage.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("encode failed"))
    }

    /// Decode and validate a blob written by [`to_blob`](Self::to_blob).
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted blob"))?;
        config.validate()?;
        Ok(config)
    }
}
