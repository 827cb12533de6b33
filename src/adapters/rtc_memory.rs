//! Retained-state adapter backed by RTC slow memory.
//!
//! On ESP-IDF the blob lives in `.rtc.data`, which keeps its contents
//! through deep sleep and is reinitialised from flash on power-on.  On the
//! host the adapter owns a plain buffer.
//!
//! The wire layout and integrity check are in [`crate::retained`].

use log::{info, warn};

use crate::app::ports::RetainedPort;
use crate::app::state::ControllerState;
use crate::retained::{self, Blob, RetainedError, BLOB_LEN};

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static mut RTC_BLOB: Blob = [0u8; BLOB_LEN];

pub struct RtcRetained {
    #[cfg(not(target_os = "espidf"))]
    blob: Blob,
}

impl Default for RtcRetained {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcRetained {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            blob: [0u8; BLOB_LEN],
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Blob {
        // SAFETY: single-threaded access during the episode; volatile so the
        // read is not folded into the zero initialiser.
        unsafe { core::ptr::read_volatile(&raw const RTC_BLOB) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Blob {
        self.blob
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, blob: &Blob) {
        // SAFETY: as in read_blob; `&mut self` serialises writers.
        unsafe { core::ptr::write_volatile(&raw mut RTC_BLOB, *blob) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, blob: &Blob) {
        self.blob = *blob;
    }

    /// Simulation: damage one byte of the region.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_corrupt(&mut self, index: usize) {
        self.blob[index % BLOB_LEN] ^= 0xA5;
    }
}

impl RetainedPort for RtcRetained {
    fn load(&self) -> Option<ControllerState> {
        match retained::decode(&self.read_blob()) {
            Ok(state) => Some(state),
            Err(RetainedError::BadMagic) => {
                info!("RTC: no retained state (power-on)");
                None
            }
            Err(e) => {
                warn!("RTC: retained state discarded: {}", e);
                None
            }
        }
    }

    fn store(&mut self, state: &ControllerState) {
        match retained::encode(state) {
            Ok(blob) => self.write_blob(&blob),
            Err(e) => warn!("RTC: state not retained: {}", e),
        }
    }
}
