//! Logical endpoints of the serial service.
//!
//! The layout is the Nordic UART Service, which most BLE terminal apps
//! recognise as a serial port:
//!
//! | Endpoint  | UUID                                   | Perms  |
//! |-----------|----------------------------------------|--------|
//! | Service   | `6e400001-b5a3-f393-e0a9-e50e24dcca9e` | n/a    |
//! | Data in   | `6e400002-b5a3-f393-e0a9-e50e24dcca9e` | Write  |
//! | Data out  | `6e400003-b5a3-f393-e0a9-e50e24dcca9e` | Notify |

pub const SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_DATA_IN: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_DATA_OUT: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Endpoint {
    /// The service itself (identity).
    Service = 0,
    /// Peer writes bytes here; they land in the inbound queue.
    DataIn = 1,
    /// Device notifies bytes to the peer here.
    DataOut = 2,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Self::Service, Self::DataIn, Self::DataOut];

    pub const fn uuid(self) -> u128 {
        match self {
            Self::Service => SERVICE_UUID,
            Self::DataIn => CHAR_DATA_IN,
            Self::DataOut => CHAR_DATA_OUT,
        }
    }

    pub fn from_uuid(uuid: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.uuid() == uuid)
    }
}

/// Access direction of an endpoint, seen from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ReadableByPeer,
    WritableByPeer,
    Notifiable,
}
