//! Bluedroid radio adapter.
//!
//! Implements [`RadioStack`], the hexagonal boundary between the serial
//! core and the Bluetooth controller.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests, with
//!   `sim_peer_*` hooks that drive the registered callbacks.
//!
//! ## Registration sequence
//!
//! Bluedroid registers GATT objects asynchronously. The core declares the
//! service and endpoints up front; `start_service` then kicks off the
//! chain, each step issued from the completion event of the previous one:
//!
//! ```text
//! app_register ─▶ REG_EVT ─▶ create_service ─▶ CREATE_EVT ─▶ add_char[0]
//!   ─▶ ADD_CHAR_EVT ─▶ (CCCD for notify chars ─▶ ADD_CHAR_DESCR_EVT) ─▶ add_char[1] …
//! ```

use log::{info, warn};

use crate::app::endpoints::{Direction, Endpoint};
use crate::app::ports::{ConnectionObserver, DataSink, RadioStack};
use crate::config::MAX_DEVICE_NAME_LEN;
use crate::error::RadioError;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Largest attribute value Bluedroid accepts.
const MAX_VALUE_LEN: usize = 512;
/// Characteristics a single service may declare.
const MAX_CHARS: usize = 3;

// ───────────────────────────────────────────────────────────────
// Stack state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    Uninitialised,
    Ready,
    Serving,
    Broadcasting,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter and
// to the observer/sink the core registered.
// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};
#[cfg(target_os = "espidf")]
use std::sync::Mutex;

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
/// Index into `BLE_PLAN` of the characteristic being added.
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
/// Attribute handle per [`Endpoint`] discriminant (0 = not registered).
#[cfg(target_os = "espidf")]
static BLE_CHAR_HANDLES: [AtomicU32; 3] = [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)];

#[cfg(target_os = "espidf")]
static BLE_SERVICE: Mutex<Option<Endpoint>> = Mutex::new(None);
#[cfg(target_os = "espidf")]
static BLE_PLAN: Mutex<heapless::Vec<(Endpoint, Direction), MAX_CHARS>> =
    Mutex::new(heapless::Vec::new());
#[cfg(target_os = "espidf")]
static BLE_OBSERVER: Mutex<Option<&'static dyn ConnectionObserver>> = Mutex::new(None);
#[cfg(target_os = "espidf")]
static BLE_SINKS: Mutex<[Option<&'static dyn DataSink>; 3]> = Mutex::new([None; 3]);

#[cfg(target_os = "espidf")]
const CCCD_UUID: u16 = 0x2902;

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    unsafe {
        t.uuid.uuid128 = uuid.to_le_bytes();
    }
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn gatt_perm_prop(direction: Direction) -> (u32, u32) {
    use esp_idf_svc::sys::*;
    match direction {
        Direction::ReadableByPeer => (ESP_GATT_PERM_READ, ESP_GATT_CHAR_PROP_BIT_READ),
        Direction::WritableByPeer => (
            ESP_GATT_PERM_WRITE,
            ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
        ),
        Direction::Notifiable => (
            ESP_GATT_PERM_READ,
            ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY,
        ),
    }
}

/// Add the characteristic at `BLE_CHAR_STEP`, if any remain.
#[cfg(target_os = "espidf")]
unsafe fn add_next_char(svc_handle: u16) {
    use esp_idf_svc::sys::*;
    let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
    let next = BLE_PLAN.lock().ok().and_then(|plan| plan.get(step).copied());
    let Some((endpoint, direction)) = next else {
        log::info!("BLE GATTS: all characteristics registered");
        return;
    };
    let (perm, prop) = gatt_perm_prop(direction);
    let mut char_uuid = uuid128_to_esp(endpoint.uuid());
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }
}

#[cfg(target_os = "espidf")]
fn endpoint_for_handle(handle: u32) -> Option<Endpoint> {
    Endpoint::ALL
        .into_iter()
        .find(|e| handle != 0 && BLE_CHAR_HANDLES[*e as usize].load(AtomicOrdering::Relaxed) == handle)
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let service = BLE_SERVICE
                .lock()
                .ok()
                .and_then(|s| *s)
                .unwrap_or(Endpoint::Service);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(service.uuid()),
                    inst_id: 0,
                },
                is_primary: true,
            };
            unsafe {
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, 10);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            BLE_CHAR_STEP.store(0, AtomicOrdering::Relaxed);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                add_next_char(svc_handle);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
            let planned = BLE_PLAN.lock().ok().and_then(|plan| plan.get(step).copied());
            let Some((endpoint, direction)) = planned else {
                return;
            };
            BLE_CHAR_HANDLES[endpoint as usize].store(handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: {:?} char (handle={})", endpoint, handle);

            if direction == Direction::Notifiable {
                // Peers subscribe through the CCCD; continue after it lands.
                let mut cccd = uuid16_to_esp(CCCD_UUID);
                unsafe {
                    esp_ble_gatts_add_char_descr(
                        svc_handle,
                        &mut cccd,
                        (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                        core::ptr::null_mut(),
                        core::ptr::null_mut(),
                    );
                }
            } else {
                BLE_CHAR_STEP.store(step as u32 + 1, AtomicOrdering::Relaxed);
                unsafe { add_next_char(svc_handle) };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            BLE_CHAR_STEP.fetch_add(1, AtomicOrdering::Relaxed);
            unsafe { add_next_char(svc_handle) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let conn_id = unsafe { (*param).connect.conn_id };
            BLE_CONN_ID.store(conn_id as u32, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Release);
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
            let observer = BLE_OBSERVER.lock().ok().and_then(|o| *o);
            if let Some(observer) = observer {
                observer.on_attach();
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTED.store(false, AtomicOrdering::Release);
            log::info!("BLE GATTS: client disconnected");
            // Advertising is restarted by the core after its settle delay.
            let observer = BLE_OBSERVER.lock().ok().and_then(|o| *o);
            if let Some(observer) = observer {
                observer.on_detach();
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.need_rsp {
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
            }
            if p.value.is_null() || p.len == 0 {
                return;
            }
            let Some(endpoint) = endpoint_for_handle(p.handle as u32) else {
                return;
            };
            let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
            let sink = BLE_SINKS.lock().ok().and_then(|s| s[endpoint as usize]);
            if let Some(sink) = sink {
                sink.on_bytes(endpoint, data);
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Bluedroid adapter
// ───────────────────────────────────────────────────────────────

pub struct BluedroidStack {
    state: StackState,
    device_name: heapless::String<MAX_DEVICE_NAME_LEN>,
    service: Option<Endpoint>,
    plan: heapless::Vec<(Endpoint, Direction), MAX_CHARS>,
    tx_value: heapless::Vec<u8, MAX_VALUE_LEN>,
    #[cfg(not(target_os = "espidf"))]
    sim_observer: Option<&'static dyn ConnectionObserver>,
    #[cfg(not(target_os = "espidf"))]
    sim_sinks: [Option<&'static dyn DataSink>; 3],
    /// Simulation: every notified payload, oldest first.
    #[cfg(not(target_os = "espidf"))]
    sim_sent: std::vec::Vec<heapless::Vec<u8, MAX_VALUE_LEN>>,
    #[cfg(not(target_os = "espidf"))]
    sim_broadcasts: u32,
}

impl Default for BluedroidStack {
    fn default() -> Self {
        Self::new()
    }
}

impl BluedroidStack {
    pub fn new() -> Self {
        Self {
            state: StackState::Uninitialised,
            device_name: heapless::String::new(),
            service: None,
            plan: heapless::Vec::new(),
            tx_value: heapless::Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_observer: None,
            #[cfg(not(target_os = "espidf"))]
            sim_sinks: [None; 3],
            #[cfg(not(target_os = "espidf"))]
            sim_sent: std::vec::Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_broadcasts: 0,
        }
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn require_init(&self) -> Result<(), RadioError> {
        match self.state {
            StackState::Uninitialised | StackState::Failed => Err(RadioError::NotInitialised),
            _ => Ok(()),
        }
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulation: a central connects.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_peer_connect(&mut self) {
        info!("BLE(sim): central connected");
        if self.state == StackState::Broadcasting {
            self.state = StackState::Serving;
        }
        if let Some(observer) = self.sim_observer {
            observer.on_attach();
        }
    }

    /// Simulation: the central disconnects. Advertising stays off until
    /// the core restarts it.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_peer_disconnect(&mut self) {
        info!("BLE(sim): central disconnected");
        if let Some(observer) = self.sim_observer {
            observer.on_detach();
        }
    }

    /// Simulation: the central writes `bytes` to `endpoint`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_peer_write(&mut self, endpoint: Endpoint, bytes: &[u8]) {
        if let Some(sink) = self.sim_sinks[endpoint as usize] {
            sink.on_bytes(endpoint, bytes);
        } else {
            warn!("BLE(sim): write to {:?} has no sink", endpoint);
        }
    }

    /// Simulation: payloads notified so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[heapless::Vec<u8, MAX_VALUE_LEN>] {
        &self.sim_sent
    }

    /// Simulation: how many times advertising was started.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_broadcasts(&self) -> u32 {
        self.sim_broadcasts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_init failed ({})", ret);
                return Err(RadioError::StackInitFailed);
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_enable failed ({})", ret);
                return Err(RadioError::StackInitFailed);
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_init failed ({})", ret);
                return Err(RadioError::StackInitFailed);
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_enable failed ({})", ret);
                return Err(RadioError::StackInitFailed);
            }

            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));

            // GAP wants a NUL-terminated name.
            let mut name = heapless::Vec::<u8, { MAX_DEVICE_NAME_LEN + 1 }>::new();
            let _ = name.extend_from_slice(self.device_name.as_bytes());
            let _ = name.push(0);
            esp_ble_gap_set_device_name(name.as_ptr() as *const _);
        }
        info!(
            "BLE(espidf): Bluedroid stack initialized as '{}'",
            self.device_name
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<(), RadioError> {
        info!("BLE(sim): stack initialized as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_register_observer(&mut self, observer: &'static dyn ConnectionObserver) {
        if let Ok(mut slot) = BLE_OBSERVER.lock() {
            *slot = Some(observer);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_register_observer(&mut self, observer: &'static dyn ConnectionObserver) {
        self.sim_observer = Some(observer);
    }

    #[cfg(target_os = "espidf")]
    fn platform_register_sink(&mut self, endpoint: Endpoint, sink: &'static dyn DataSink) {
        if let Ok(mut sinks) = BLE_SINKS.lock() {
            sinks[endpoint as usize] = Some(sink);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_register_sink(&mut self, endpoint: Endpoint, sink: &'static dyn DataSink) {
        self.sim_sinks[endpoint as usize] = Some(sink);
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_service(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        if let Ok(mut service) = BLE_SERVICE.lock() {
            *service = self.service;
        }
        if let Ok(mut plan) = BLE_PLAN.lock() {
            plan.clone_from(&self.plan);
        }
        let ret = unsafe { esp_ble_gatts_app_register(0) };
        if ret != ESP_OK as i32 {
            log::error!("BLE: gatts_app_register failed ({})", ret);
            return Err(RadioError::RegistrationFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_service(&mut self) -> Result<(), RadioError> {
        info!(
            "BLE(sim): service {:032x} started with {} characteristic(s)",
            self.service.map_or(0, Endpoint::uuid),
            self.plan.len()
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_broadcasting(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        let ret = unsafe {
            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: 0x20,
                adv_int_max: 0x40,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..core::mem::zeroed()
            };
            esp_ble_gap_start_advertising(&mut adv_params)
        };
        if ret != ESP_OK as i32 {
            warn!("BLE: start_advertising failed ({})", ret);
            return Err(RadioError::BroadcastFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_broadcasting(&mut self) -> Result<(), RadioError> {
        self.sim_broadcasts += 1;
        info!("BLE(sim): advertising '{}'", self.device_name);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_set_value(&mut self, endpoint: Endpoint) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        let handle = BLE_CHAR_HANDLES[endpoint as usize].load(AtomicOrdering::Relaxed);
        if handle == 0 {
            return Err(RadioError::NotifyFailed);
        }
        let ret = unsafe {
            esp_ble_gatts_set_attr_value(
                handle as u16,
                self.tx_value.len() as u16,
                self.tx_value.as_ptr(),
            )
        };
        if ret != ESP_OK as i32 {
            return Err(RadioError::NotifyFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_set_value(&mut self, _endpoint: Endpoint) -> Result<(), RadioError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, endpoint: Endpoint) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        let handle = BLE_CHAR_HANDLES[endpoint as usize].load(AtomicOrdering::Relaxed);
        if handle == 0 || !BLE_CONNECTED.load(AtomicOrdering::Acquire) {
            return Err(RadioError::NotifyFailed);
        }
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as u8,
                BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16,
                handle as u16,
                self.tx_value.len() as u16,
                self.tx_value.as_mut_ptr(),
                false,
            )
        };
        if ret != ESP_OK as i32 {
            return Err(RadioError::NotifyFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, endpoint: Endpoint) -> Result<(), RadioError> {
        info!("BLE(sim): notify {:?} ({} bytes)", endpoint, self.tx_value.len());
        self.sim_sent.push(self.tx_value.clone());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_shutdown(&mut self) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_ble_gap_stop_advertising();
            esp_bluedroid_disable();
            esp_bluedroid_deinit();
            esp_bt_controller_disable();
            esp_bt_controller_deinit();
        }
        // No DISCONNECT_EVT arrives once the stack is gone.
        if BLE_CONNECTED.swap(false, AtomicOrdering::AcqRel) {
            let observer = BLE_OBSERVER.lock().ok().and_then(|o| *o);
            if let Some(observer) = observer {
                observer.on_detach();
            }
        }
        for handle in &BLE_CHAR_HANDLES {
            handle.store(0, AtomicOrdering::Relaxed);
        }
        info!("BLE(espidf): stack shut down");
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_shutdown(&mut self) {
        info!("BLE(sim): stopped");
    }
}

// ───────────────────────────────────────────────────────────────
// RadioStack implementation
// ───────────────────────────────────────────────────────────────

impl RadioStack for BluedroidStack {
    fn init(&mut self, identity: &str) -> Result<(), RadioError> {
        self.device_name.clear();
        self.device_name
            .push_str(identity)
            .map_err(|_| RadioError::StackInitFailed)?;
        match self.platform_init() {
            Ok(()) => {
                self.state = StackState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = StackState::Failed;
                Err(e)
            }
        }
    }

    fn create_service(&mut self, service: Endpoint) -> Result<(), RadioError> {
        self.require_init()?;
        self.service = Some(service);
        self.plan.clear();
        Ok(())
    }

    fn create_endpoint(
        &mut self,
        service: Endpoint,
        endpoint: Endpoint,
        direction: Direction,
    ) -> Result<(), RadioError> {
        self.require_init()?;
        if self.service != Some(service) || endpoint == service {
            return Err(RadioError::RegistrationFailed);
        }
        self.plan
            .push((endpoint, direction))
            .map_err(|_| RadioError::RegistrationFailed)
    }

    fn register_connection_callbacks(&mut self, observer: &'static dyn ConnectionObserver) {
        self.platform_register_observer(observer);
    }

    fn register_write_callback(&mut self, endpoint: Endpoint, sink: &'static dyn DataSink) {
        self.platform_register_sink(endpoint, sink);
    }

    fn start_service(&mut self) -> Result<(), RadioError> {
        self.require_init()?;
        if self.service.is_none() {
            return Err(RadioError::RegistrationFailed);
        }
        self.platform_start_service()?;
        self.state = StackState::Serving;
        Ok(())
    }

    fn start_broadcasting(&mut self) -> Result<(), RadioError> {
        self.require_init()?;
        self.platform_start_broadcasting()?;
        self.state = StackState::Broadcasting;
        Ok(())
    }

    fn set_endpoint_value(&mut self, endpoint: Endpoint, bytes: &[u8]) -> Result<(), RadioError> {
        self.require_init()?;
        self.tx_value.clear();
        self.tx_value
            .extend_from_slice(bytes)
            .map_err(|_| RadioError::NotifyFailed)?;
        self.platform_set_value(endpoint)
    }

    fn notify(&mut self, endpoint: Endpoint) -> Result<(), RadioError> {
        self.require_init()?;
        self.platform_notify(endpoint)
    }

    fn shutdown(&mut self) {
        if self.state == StackState::Uninitialised {
            return;
        }
        self.platform_shutdown();
        self.state = StackState::Uninitialised;
        self.plan.clear();
        self.service = None;
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
