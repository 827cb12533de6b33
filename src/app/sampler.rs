//! Sensor sampler: one consistent snapshot of every monitored input.
//!
//! The sampler is the only place the episode touches the [`SensorPort`].
//! Every digital and analog input is read exactly once per episode,
//! whatever woke the device.

use log::debug;

use super::ports::SensorPort;

/// Binary wake inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalInput {
    Letter,
    Parcel,
    Motion,
}

impl DigitalInput {
    pub const ALL: [Self; 3] = [Self::Letter, Self::Parcel, Self::Motion];
}

/// Analog metrics republished on the telemetry cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogInput {
    /// DHT22 temperature, °C.
    Temperature,
    /// DHT22 relative humidity, %RH.
    Humidity,
    /// Battery voltage, V.
    BatteryVoltage,
    /// INA219 current on the solar input, mA.
    SolarCurrent,
    /// INA219 current on the battery line, mA.
    BatteryCurrent,
}

impl AnalogInput {
    pub const ALL: [Self; 5] = [
        Self::Temperature,
        Self::Humidity,
        Self::BatteryVoltage,
        Self::SolarCurrent,
        Self::BatteryCurrent,
    ];
}

/// A point-in-time snapshot of every sensor.
///
/// Analog fields are `NaN` when the driver reported a transient failure.
#[derive(Debug, Clone, Copy)]
pub struct SensorSnapshot {
    pub letter: bool,
    pub parcel: bool,
    pub motion: bool,

    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub vbat_v: f32,
    pub solar_ma: f32,
    pub battery_ma: f32,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            letter: false,
            parcel: false,
            motion: false,
            temperature_c: f32::NAN,
            humidity_pct: f32::NAN,
            vbat_v: f32::NAN,
            solar_ma: f32::NAN,
            battery_ma: f32::NAN,
        }
    }
}

impl SensorSnapshot {
    pub fn digital(&self, input: DigitalInput) -> bool {
        match input {
            DigitalInput::Letter => self.letter,
            DigitalInput::Parcel => self.parcel,
            DigitalInput::Motion => self.motion,
        }
    }

    pub fn analog(&self, input: AnalogInput) -> f32 {
        match input {
            AnalogInput::Temperature => self.temperature_c,
            AnalogInput::Humidity => self.humidity_pct,
            AnalogInput::BatteryVoltage => self.vbat_v,
            AnalogInput::SolarCurrent => self.solar_ma,
            AnalogInput::BatteryCurrent => self.battery_ma,
        }
    }

    /// `true` if any wake input is currently high.
    pub fn any_input_high(&self) -> bool {
        self.letter || self.parcel || self.motion
    }
}

/// Reads a [`SensorSnapshot`] through the sensor port.
pub struct Sampler;

impl Sampler {
    pub fn sample(hw: &mut impl SensorPort) -> SensorSnapshot {
        // The DHT22 transaction is the slowest read; do the digital inputs
        // first so the levels are as close to the wake edge as possible.
        let letter = hw.read_digital(DigitalInput::Letter);
        let parcel = hw.read_digital(DigitalInput::Parcel);
        let motion = hw.read_digital(DigitalInput::Motion);

        let snapshot = SensorSnapshot {
            letter,
            parcel,
            motion,
            temperature_c: hw.read_analog(AnalogInput::Temperature),
            humidity_pct: hw.read_analog(AnalogInput::Humidity),
            vbat_v: hw.read_analog(AnalogInput::BatteryVoltage),
            solar_ma: hw.read_analog(AnalogInput::SolarCurrent),
            battery_ma: hw.read_analog(AnalogInput::BatteryCurrent),
        };
        debug!("sampled {:?}", snapshot);
        snapshot
    }
}
