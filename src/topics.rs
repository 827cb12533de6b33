//! MQTT topic names.

use crate::app::sampler::{AnalogInput, DigitalInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Letter,
    Parcel,
    Motion,
    Temperature,
    Humidity,
    BatteryVoltage,
    SolarCurrent,
    BatteryCurrent,
    Rssi,
    Ip,
}

impl Topic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Letter => "mailbox/letter",
            Self::Parcel => "mailbox/parcel",
            Self::Motion => "mailbox/pir",
            Self::Temperature => "mailbox/temperature",
            Self::Humidity => "mailbox/humidity",
            Self::BatteryVoltage => "mailbox/vbat",
            Self::SolarCurrent => "mailbox/icsolaire",
            Self::BatteryCurrent => "mailbox/icbatterie",
            Self::Rssi => "mailbox/rssi",
            Self::Ip => "mailbox/ip",
        }
    }

    pub const fn for_digital(input: DigitalInput) -> Self {
        match input {
            DigitalInput::Letter => Self::Letter,
            DigitalInput::Parcel => Self::Parcel,
            DigitalInput::Motion => Self::Motion,
        }
    }

    pub const fn for_analog(input: AnalogInput) -> Self {
        match input {
            AnalogInput::Temperature => Self::Temperature,
            AnalogInput::Humidity => Self::Humidity,
            AnalogInput::BatteryVoltage => Self::BatteryVoltage,
            AnalogInput::SolarCurrent => Self::SolarCurrent,
            AnalogInput::BatteryCurrent => Self::BatteryCurrent,
        }
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
