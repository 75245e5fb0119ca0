//! BLE serial firmware entry point.
//!
//! Brings up the Bluedroid stack, advertises the serial service and echoes
//! every received line back to the peer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  BluedroidStack (RadioStack)        LogEventSink (EventSink) │
//! │  NvsConfigStore (ConfigPort)                                 │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  BleSerial  ◀──  static SerialLink (queue + flag)      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use bleserial::adapters::ble::BluedroidStack;
use bleserial::adapters::log_sink::LogEventSink;
use bleserial::adapters::nvs::NvsConfigStore;
use bleserial::app::ports::ConfigPort;
use bleserial::app::service::BleSerial;
use bleserial::config::{RX_CAPACITY, SerialConfig};
use bleserial::error::Error;
use bleserial::link::SerialLink;

/// Shared between the Bluedroid callbacks and the main loop.
static LINK: SerialLink<RX_CAPACITY> = SerialLink::new();

/// Main loop period.
const TICK_MS: u32 = 10;
/// Ticks between statistics reports (~30 s).
const STATS_EVERY: u32 = 3_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  BLESerial v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsConfigStore::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SerialConfig::default()
        }
    };

    // ── 3. Serial link ────────────────────────────────────────
    let name = config.device_name.clone();
    let mut serial =
        BleSerial::new(BluedroidStack::new(), &LINK, config).context("serial init failed")?;

    let mut events = LogEventSink::new();
    serial.begin(&name, &mut events).context("BLE start failed")?;

    // ── 4. Main loop ──────────────────────────────────────────
    let mut delay = FreeRtos;
    let mut ticks: u32 = 0;
    loop {
        serial.poll(&mut delay, &mut events);

        while serial.has_data() {
            let line = serial.read_configured_line();
            if line.is_empty() {
                continue;
            }
            info!("rx: {} byte(s)", line.len());
            match serial.write_chunked(&line) {
                Ok(sent) if sent < line.len() => {
                    warn!("echo truncated: {}/{} byte(s)", sent, line.len());
                }
                Ok(_) | Err(Error::NotConnected) => {}
                Err(e) => warn!("echo failed: {}", e),
            }
        }

        ticks = ticks.wrapping_add(1);
        if ticks % STATS_EVERY == 0 {
            serial.report_stats(&mut events);
        }

        FreeRtos::delay_ms(TICK_MS);
    }
}
