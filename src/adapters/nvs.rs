//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the mailbox sensor.  The override is a
//! JSON blob under namespace `mailbox`, key `config`; fields it does not
//! name keep their compile-time defaults (`#[serde(default)]`), so a
//! partial blob written with the IDF NVS partition generator is enough to
//! change the broker address or a pin.
//!
//! - Config validation: all fields are range-checked on load and before
//!   persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{RunMode, SystemConfig};
use crate::drivers::hw_init;
use crate::pins;
use log::info;

use super::utils::is_printable_ascii;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

const CONFIG_NAMESPACE: &str = "mailbox";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "config";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 2048;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Store a raw blob under the config key, bypassing validation.
    /// Simulation only: lets tests plant corrupt or out-of-range data.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_put_raw(&self, bytes: &[u8]) {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes.to_vec());
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// Raw config blob, `Ok(None)` when nothing is stored.
    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        Ok(self.store.borrow().get(&key).cloned())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
            let key_cstr = b"config\0";
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // nvs_open fails with NOT_FOUND too while the namespace is new.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
            let key_cstr = b"config\0";
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })
    }
}

/// Range-check every field.  Out-of-range values are rejected, never
/// clamped.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !is_printable_ascii(&cfg.wifi_ssid) || !is_printable_ascii(&cfg.wifi_password) {
        return Err(ConfigError::ValidationFailed(
            "wifi credentials must be printable ASCII",
        ));
    }
    if cfg.broker_host.is_empty() || !is_printable_ascii(&cfg.broker_host) {
        return Err(ConfigError::ValidationFailed(
            "broker_host must be non-empty printable ASCII",
        ));
    }
    if cfg.broker_port == 0 {
        return Err(ConfigError::ValidationFailed("broker_port must be 1–65535"));
    }
    if !is_printable_ascii(&cfg.client_id) {
        return Err(ConfigError::ValidationFailed(
            "client_id must be printable ASCII",
        ));
    }

    let wake = [cfg.pin_letter, cfg.pin_parcel, cfg.pin_motion];
    if !wake.iter().all(|p| pins::is_rtc_gpio(*p)) {
        return Err(ConfigError::ValidationFailed(
            "wake pins must be RTC-capable GPIOs",
        ));
    }
    if wake[0] == wake[1] || wake[0] == wake[2] || wake[1] == wake[2] {
        return Err(ConfigError::ValidationFailed("wake pins must be distinct"));
    }
    if hw_init::adc1_channel(cfg.pin_vbat).is_none() {
        return Err(ConfigError::ValidationFailed(
            "pin_vbat must be an ADC1 pin (32–39)",
        ));
    }
    if [cfg.pin_dht_data, cfg.pin_i2c_sda, cfg.pin_i2c_scl]
        .iter()
        .any(|p| *p > pins::MAX_GPIO)
    {
        return Err(ConfigError::ValidationFailed("GPIO number out of range"));
    }

    let ina = 0x40..=0x4F;
    if !ina.contains(&cfg.ina_solar_addr) || !ina.contains(&cfg.ina_battery_addr) {
        return Err(ConfigError::ValidationFailed(
            "INA219 addresses must be 0x40–0x4F",
        ));
    }
    if cfg.ina_solar_addr == cfg.ina_battery_addr {
        return Err(ConfigError::ValidationFailed(
            "INA219 addresses must be distinct",
        ));
    }
    if !(1.0..=10.0).contains(&cfg.vbat_divider_ratio) {
        return Err(ConfigError::ValidationFailed(
            "vbat_divider_ratio must be 1.0–10.0",
        ));
    }

    if !(100..=60_000).contains(&cfg.debounce_ms) {
        return Err(ConfigError::ValidationFailed(
            "debounce_ms must be 100–60000",
        ));
    }
    if !(10..=86_400).contains(&cfg.telemetry_cadence_secs) {
        return Err(ConfigError::ValidationFailed(
            "telemetry_cadence_secs must be 10–86400",
        ));
    }
    if cfg.run_mode == RunMode::Continuous && !(50..=10_000).contains(&cfg.poll_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "poll_interval_ms must be 50–10000",
        ));
    }
    if !(1_000..=60_000).contains(&cfg.level_recheck_ms) {
        return Err(ConfigError::ValidationFailed(
            "level_recheck_ms must be 1000–60000",
        ));
    }
    if !(1..=10).contains(&cfg.publish_max_attempts) {
        return Err(ConfigError::ValidationFailed(
            "publish_max_attempts must be 1–10",
        ));
    }
    if cfg.publish_retry_delay_ms > 30_000 {
        return Err(ConfigError::ValidationFailed(
            "publish_retry_delay_ms must be ≤ 30000",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        info!("NvsAdapter: loaded config override ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = serde_json::to_vec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Falls back to an unusable handle; loads then return defaults.
        Self::new().unwrap_or(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }
}
