//! Clock adapter.
//!
//! Implements [`ClockPort`] with a millisecond clock that keeps counting
//! through deep sleep, so the debounce window and the telemetry cadence
//! span episodes.
//!
//! - **`target_os = "espidf"`**: `gettimeofday()`, which ESP-IDF backs
//!   with the RTC timer that runs during deep sleep.  `esp_timer` would
//!   restart from zero on every wake.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` from
//!   construction, for host-side tests.

use crate::app::ports::ClockPort;

pub struct RtcClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for RtcClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot of the current episode (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for RtcClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: tv is a valid out-pointer; the timezone argument may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return self.uptime_us() / 1000;
        }
        let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
        let usecs = u64::try_from(tv.tv_usec).unwrap_or(0);
        secs * 1000 + usecs / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
