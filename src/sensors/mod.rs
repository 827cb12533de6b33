//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every driver plus the shared I2C bus and answers the
//! per-input reads of the [`SensorPort`](crate::app::ports::SensorPort)
//! (through [`HardwareAdapter`](crate::adapters::hardware::HardwareAdapter)).
//! Failures never propagate: they turn into `NaN` and a warning.

pub mod battery;
pub mod dht22;
pub mod ina219;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::sampler::{AnalogInput, DigitalInput};
use crate::config::PinMap;
use crate::drivers::hw_init;
use battery::BatteryMonitor;
use dht22::{Dht22, DhtReading};
use ina219::Ina219;

/// Name of every sensor that can fail at init, for event reporting.
pub const SOLAR_MONITOR: &str = "ina219-solar";
pub const BATTERY_MONITOR: &str = "ina219-battery";

/// Aggregates all sensor drivers.
pub struct SensorHub<I, P, D> {
    i2c: I,
    /// `None` when the monitor failed to initialise.
    solar: Option<Ina219>,
    battery_line: Option<Ina219>,
    dht: Dht22<P, D>,
    /// Outcome of the transaction made for the temperature query, handed
    /// to the humidity query that follows it.  `Some(None)` is a failed read.
    climate: Option<Option<DhtReading>>,
    battery: BatteryMonitor,
    pins: PinMap,
}

impl<I, P, D> SensorHub<I, P, D>
where
    I: I2c,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Build the hub and initialise the I2C monitors.
    ///
    /// Returns the hub and the names of monitors that did not answer.  A
    /// missing monitor is not fatal; its metric reads `NaN`.
    pub fn new(
        mut i2c: I,
        solar_addr: u8,
        battery_addr: u8,
        dht: Dht22<P, D>,
        battery: BatteryMonitor,
        pins: PinMap,
    ) -> (Self, heapless::Vec<&'static str, 2>) {
        let mut missing = heapless::Vec::new();

        let mut init = |addr: u8, name: &'static str| {
            let mut ina = Ina219::new(addr);
            match ina.init(&mut i2c) {
                Ok(()) => Some(ina),
                Err(e) => {
                    warn!("{} at 0x{:02X}: {}", name, addr, e);
                    let _ = missing.push(name);
                    None
                }
            }
        };
        let solar = init(solar_addr, SOLAR_MONITOR);
        let battery_line = init(battery_addr, BATTERY_MONITOR);

        (
            Self {
                i2c,
                solar,
                battery_line,
                dht,
                climate: None,
                battery,
                pins,
            },
            missing,
        )
    }

    pub fn read_digital(&mut self, input: DigitalInput) -> bool {
        hw_init::gpio_read(self.pins.gpio(input))
    }

    pub fn read_analog(&mut self, input: AnalogInput) -> f32 {
        match input {
            // One DHT transaction serves both climate queries, failed or not.
            AnalogInput::Temperature => {
                let reading = self.read_climate();
                self.climate = Some(reading);
                reading.map_or(f32::NAN, |r| r.temperature_c)
            }
            AnalogInput::Humidity => {
                let reading = match self.climate.take() {
                    Some(shared) => shared,
                    None => self.read_climate(),
                };
                reading.map_or(f32::NAN, |r| r.humidity_pct)
            }
            AnalogInput::BatteryVoltage => match self.battery.read_volts() {
                Ok(v) => v,
                Err(e) => {
                    warn!("vbat: {}", e);
                    f32::NAN
                }
            },
            AnalogInput::SolarCurrent => read_current(&mut self.i2c, self.solar.as_mut()),
            AnalogInput::BatteryCurrent => {
                read_current(&mut self.i2c, self.battery_line.as_mut())
            }
        }
    }

    fn read_climate(&mut self) -> Option<DhtReading> {
        match self.dht.read() {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("dht22: {}", e);
                None
            }
        }
    }
}

fn read_current<I: I2c>(i2c: &mut I, monitor: Option<&mut Ina219>) -> f32 {
    let Some(ina) = monitor else {
        return f32::NAN;
    };
    match ina.read_current_ma(i2c) {
        Ok(ma) => ma,
        Err(e) => {
            warn!("ina219 at 0x{:02X}: {}", ina.addr(), e);
            f32::NAN
        }
    }
}
