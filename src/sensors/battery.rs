//! Battery voltage through a resistive divider on an ADC1 pin.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: oneshot read via [`hw_init::adc1_read`].
//! On host/test: reads the injected value from `hw_init::sim_set_adc`.

use crate::drivers::hw_init;
use crate::error::SensorError;

const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

/// Convert a raw 12-bit sample to battery volts.
pub fn raw_to_volts(raw: u16, divider_ratio: f32) -> f32 {
    (f32::from(raw) / ADC_MAX) * V_REF * divider_ratio
}

pub struct BatteryMonitor {
    channel: u32,
    divider_ratio: f32,
}

impl BatteryMonitor {
    pub fn new(channel: u32, divider_ratio: f32) -> Self {
        Self {
            channel,
            divider_ratio,
        }
    }

    pub fn read_volts(&self) -> Result<f32, SensorError> {
        let raw = hw_init::adc1_read(self.channel).ok_or(SensorError::AdcReadFailed)?;
        Ok(raw_to_volts(raw, self.divider_ratio))
    }
}
