//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the board if an episode hangs (a wedged I2C bus, a WiFi driver
//! that never reports back).  The timeout covers the worst legitimate
//! episode: every failed attempt the publisher allows before it defers,
//! each one a full WiFi association plus broker wait, with a retry delay
//! after each.
//!
//! Continuous mode feeds it once per loop iteration.

use crate::adapters::mqtt::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::app::publisher;
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Allowance for one WiFi association attempt.
const WIFI_ATTEMPT_MS: u32 = 15_000;
/// Sensor reads, logging and sleep entry.
const EPISODE_MARGIN_MS: u32 = 30_000;

/// Watchdog timeout long enough for the publisher's whole failure budget.
pub fn episode_timeout_ms(config: &SystemConfig) -> u32 {
    let failures = publisher::failure_budget(config);
    // Retry delays only run between attempts of one message.
    let retry_delay_ms = if config.publish_max_attempts > 1 {
        config.publish_retry_delay_ms
    } else {
        0
    };
    failures
        .saturating_mul(WIFI_ATTEMPT_MS + DEFAULT_CONNECT_TIMEOUT_MS)
        .saturating_add(failures.saturating_mul(retry_delay_ms))
        .saturating_add(EPISODE_MARGIN_MS)
}

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    timeout_ms: u32,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the current task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT configuration from the main task before any
            // other task subscribes.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed, timeout_ms }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms, no-op", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
