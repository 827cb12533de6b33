//! System configuration parameters
//!
//! All tunable parameters for the mailbox sensor.  Defaults come from the
//! board constants in [`pins`](crate::pins) and from `MAILBOX_*` environment
//! variables captured at compile time; a JSON override stored in NVS
//! replaces them at boot (see [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)).

use serde::{Deserialize, Serialize};

use crate::app::sampler::DigitalInput;
use crate::pins;

pub type SsidString = heapless::String<32>;
pub type SecretString = heapless::String<64>;
pub type HostString = heapless::String<64>;
pub type UserString = heapless::String<32>;

/// How the harness behaves between episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Publish once, re-arm wake sources, deep sleep.
    DutyCycle,
    /// Stay awake and re-poll every `poll_interval_ms` (bench diagnostics).
    Continuous,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Network ---
    pub wifi_ssid: SsidString,
    pub wifi_password: SecretString,

    // --- Broker ---
    pub broker_host: HostString,
    pub broker_port: u16,
    pub broker_user: UserString,
    pub broker_password: SecretString,
    /// MQTT client id.  Empty = derived from the factory MAC.
    pub client_id: UserString,

    // --- GPIO ---
    pub pin_letter: u8,
    pub pin_parcel: u8,
    pub pin_motion: u8,
    pub pin_vbat: u8,
    pub pin_dht_data: u8,
    pub pin_i2c_sda: u8,
    pub pin_i2c_scl: u8,

    // --- Power monitors ---
    pub ina_solar_addr: u8,
    pub ina_battery_addr: u8,
    /// Battery divider ratio (Vbat / Vadc).
    pub vbat_divider_ratio: f32,

    // --- Timing ---
    /// Minimum interval between two motion trigger publishes (milliseconds)
    pub debounce_ms: u32,
    /// Full telemetry report interval (seconds)
    pub telemetry_cadence_secs: u32,
    /// Sleep/loop behaviour between episodes
    pub run_mode: RunMode,
    /// Loop period in continuous mode (milliseconds)
    pub poll_interval_ms: u32,
    /// Timer wake used while an input is held high (milliseconds)
    pub level_recheck_ms: u32,
    /// Arm a timer wake for the telemetry cadence in duty-cycle mode
    pub timer_wake_enabled: bool,

    // --- Publish retry ---
    /// Attempts per message before giving up (>= 1)
    pub publish_max_attempts: u8,
    /// Fixed delay between attempts (milliseconds)
    pub publish_retry_delay_ms: u32,
}

impl SystemConfig {
    /// Telemetry cadence in milliseconds.
    pub fn cadence_ms(&self) -> u64 {
        u64::from(self.telemetry_cadence_secs) * 1000
    }

    /// GPIO assignment of the three wake inputs.
    pub fn pin_map(&self) -> PinMap {
        PinMap {
            letter: self.pin_letter,
            parcel: self.pin_parcel,
            motion: self.pin_motion,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: bounded(option_env!("MAILBOX_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("MAILBOX_WIFI_PASSWORD").unwrap_or("")),

            // Broker
            broker_host: bounded(option_env!("MAILBOX_BROKER_HOST").unwrap_or("192.168.1.62")),
            broker_port: option_env!("MAILBOX_BROKER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            broker_user: bounded(option_env!("MAILBOX_BROKER_USER").unwrap_or("")),
            broker_password: bounded(option_env!("MAILBOX_BROKER_PASSWORD").unwrap_or("")),
            client_id: heapless::String::new(),

            // GPIO
            pin_letter: pins::LETTER_GPIO,
            pin_parcel: pins::PARCEL_GPIO,
            pin_motion: pins::MOTION_GPIO,
            pin_vbat: pins::VBAT_ADC_GPIO,
            pin_dht_data: pins::DHT_DATA_GPIO,
            pin_i2c_sda: pins::I2C_SDA_GPIO,
            pin_i2c_scl: pins::I2C_SCL_GPIO,

            // Power monitors
            ina_solar_addr: pins::INA_SOLAR_ADDR,
            ina_battery_addr: pins::INA_BATTERY_ADDR,
            vbat_divider_ratio: 2.0,

            // Timing
            debounce_ms: 2000,
            telemetry_cadence_secs: 600, // 10 min
            run_mode: RunMode::DutyCycle,
            poll_interval_ms: 200,
            level_recheck_ms: 1000,
            timer_wake_enabled: true,

            // Publish retry
            publish_max_attempts: 3,
            publish_retry_delay_ms: 5000,
        }
    }
}

/// GPIO numbers of the digital wake inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub letter: u8,
    pub parcel: u8,
    pub motion: u8,
}

impl PinMap {
    pub fn gpio(&self, input: DigitalInput) -> u8 {
        match input {
            DigitalInput::Letter => self.letter,
            DigitalInput::Parcel => self.parcel,
            DigitalInput::Motion => self.motion,
        }
    }

    /// Inputs whose GPIO bit is set in an ext1 status mask.
    pub fn inputs_in_mask(&self, mask: u64) -> heapless::Vec<DigitalInput, 3> {
        DigitalInput::ALL
            .into_iter()
            .filter(|input| mask & (1u64 << self.gpio(*input)) != 0)
            .collect()
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
