//! Sleep controller.
//!
//! Reports why the chip booted and carries out the [`WakePlan`] chosen at
//! the end of an episode: ext1 `ANY_HIGH` on the masked wake inputs plus an
//! optional RTC timer, then deep sleep.  A `Stay` plan just blocks for the
//! poll period.

use log::info;

use crate::app::ports::PowerPort;
use crate::wake::{RawWakeSource, WakePlan};

#[cfg(target_os = "espidf")]
use log::error;

// ESP-IDF `esp_sleep_source_t` values.
const WAKEUP_UNDEFINED: u32 = 0;
const WAKEUP_EXT1: u32 = 3;
const WAKEUP_TIMER: u32 = 4;

#[cfg(target_os = "espidf")]
const _: () = {
    use esp_idf_svc::sys as idf;
    assert!(WAKEUP_UNDEFINED == idf::esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED);
    assert!(WAKEUP_EXT1 == idf::esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1);
    assert!(WAKEUP_TIMER == idf::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER);
};

/// Timer armed when nothing else could be, so the chip never sleeps forever.
pub const FALLBACK_WAKE_MS: u64 = 60_000;

/// Map `esp_sleep_get_wakeup_cause()` and the ext1 status word.
pub fn raw_wake_source(cause: u32, ext1_status: u64) -> RawWakeSource {
    match cause {
        WAKEUP_UNDEFINED => RawWakeSource::Undefined,
        WAKEUP_EXT1 => RawWakeSource::Ext1 { mask: ext1_status },
        WAKEUP_TIMER => RawWakeSource::Timer,
        other => RawWakeSource::Other(other),
    }
}

pub struct SleepController {
    #[cfg(not(target_os = "espidf"))]
    sim_source: RawWakeSource,
    #[cfg(not(target_os = "espidf"))]
    sim_plans: Vec<WakePlan>,
}

impl SleepController {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            sim_source: RawWakeSource::Undefined,
            sim_plans: Vec::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_source(&mut self, source: RawWakeSource) {
        self.sim_source = source;
    }

    /// Simulation: every plan carried out so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_plans(&self) -> &[WakePlan] {
        &self.sim_plans
    }

    #[cfg(target_os = "espidf")]
    fn deep_sleep(&mut self, pin_mask: u64, timer_ms: Option<u64>) -> ! {
        use esp_idf_svc::sys as idf;

        // SAFETY: plain IDF sleep configuration calls, made from the only task.
        unsafe {
            idf::esp_sleep_disable_wakeup_source(idf::esp_sleep_source_t_ESP_SLEEP_WAKEUP_ALL);
        }

        let mut armed = false;
        if pin_mask != 0 {
            let ret = unsafe {
                idf::esp_sleep_enable_ext1_wakeup(
                    pin_mask,
                    idf::esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ANY_HIGH,
                )
            };
            if ret == idf::ESP_OK {
                armed = true;
            } else {
                error!("Sleep: ext1 arm failed (mask=0x{:x}, err={})", pin_mask, ret);
            }
        }

        let timer_ms = match timer_ms {
            Some(ms) => Some(ms),
            None if !armed => {
                error!("Sleep: no wake source armed, falling back to {} ms timer", FALLBACK_WAKE_MS);
                Some(FALLBACK_WAKE_MS)
            }
            None => None,
        };
        if let Some(ms) = timer_ms {
            let ret = unsafe { idf::esp_sleep_enable_timer_wakeup(ms * 1000) };
            if ret != idf::ESP_OK {
                error!("Sleep: timer arm failed (err={})", ret);
            }
        }

        info!("Sleep: deep sleep (mask=0x{:x}, timer={:?} ms)", pin_mask, timer_ms);
        unsafe { idf::esp_deep_sleep_start() }
    }
}

impl Default for SleepController {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerPort for SleepController {
    #[cfg(target_os = "espidf")]
    fn wake_source(&self) -> RawWakeSource {
        // SAFETY: read-only queries of the sleep subsystem.
        let cause = unsafe { esp_idf_svc::sys::esp_sleep_get_wakeup_cause() };
        let ext1 = unsafe { esp_idf_svc::sys::esp_sleep_get_ext1_wakeup_status() };
        raw_wake_source(cause, ext1)
    }

    #[cfg(not(target_os = "espidf"))]
    fn wake_source(&self) -> RawWakeSource {
        self.sim_source
    }

    #[cfg(target_os = "espidf")]
    fn enter_low_power(&mut self, plan: &WakePlan) {
        match *plan {
            WakePlan::DeepSleep { pin_mask, timer } => {
                self.deep_sleep(pin_mask, timer.map(|t| t.after_ms));
            }
            WakePlan::Stay { poll_ms } => {
                esp_idf_svc::hal::delay::FreeRtos::delay_ms(poll_ms);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn enter_low_power(&mut self, plan: &WakePlan) {
        info!("Sleep(sim): {:?}", plan);
        self.sim_plans.push(*plan);
    }
}
