//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                |
//! |------------|-------------|----------------------------|
//! | `ble`      | RadioStack  | Bluedroid GATT server      |
//! | `log_sink` | EventSink   | Serial log output          |
//! | `nvs`      | ConfigPort  | NVS flash (postcard blob)  |

pub mod ble;
pub mod log_sink;
pub mod nvs;
