//! Hardware adapter: bridges real peripherals to the domain sensor port.
//!
//! Owns the [`SensorHub`] and exposes it through [`SensorPort`].  This is
//! the only module in the system that touches sensor hardware.  On
//! non-espidf targets, the GPIO and ADC reads use cfg-gated simulation
//! stubs in [`hw_init`](crate::drivers::hw_init).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use crate::app::ports::SensorPort;
use crate::app::sampler::{AnalogInput, DigitalInput};
use crate::sensors::SensorHub;

/// Concrete adapter that puts all sensors behind the port trait.
pub struct HardwareAdapter<I, P, D> {
    sensor_hub: SensorHub<I, P, D>,
}

impl<I, P, D> HardwareAdapter<I, P, D> {
    pub fn new(sensor_hub: SensorHub<I, P, D>) -> Self {
        Self { sensor_hub }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I, P, D> SensorPort for HardwareAdapter<I, P, D>
where
    I: I2c,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_digital(&mut self, input: DigitalInput) -> bool {
        self.sensor_hub.read_digital(input)
    }

    fn read_analog(&mut self, input: AnalogInput) -> f32 {
        self.sensor_hub.read_analog(input)
    }
}
