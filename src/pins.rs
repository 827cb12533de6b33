//! Default GPIO / peripheral assignments for the mailbox sensor board
//! (classic ESP32, WROOM module).
//!
//! These are the factory defaults copied into [`SystemConfig`](crate::config::SystemConfig);
//! the running firmware always reads the pin numbers from the config so a
//! board revision only needs an NVS override.
//!
//! Wake inputs must be RTC-capable GPIOs (0, 2, 4, 12–15, 25–27, 32–39) or
//! ext1 deep-sleep wake silently ignores them.

// ---------------------------------------------------------------------------
// Wake inputs (ext1, active HIGH)
// ---------------------------------------------------------------------------

/// Reed switch on the letter flap. HIGH = flap open.
pub const LETTER_GPIO: u8 = 27;
/// Reed switch on the parcel door. HIGH = door open.
pub const PARCEL_GPIO: u8 = 15;
/// HC-SR501 passive-infrared module output. HIGH = motion.
pub const MOTION_GPIO: u8 = 4;

// ---------------------------------------------------------------------------
// Analog
// ---------------------------------------------------------------------------

/// Battery voltage through a 1:2 resistive divider. ADC1 channel 5.
pub const VBAT_ADC_GPIO: u8 = 33;

// ---------------------------------------------------------------------------
// Environmental / power monitors
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line (open drain, external 10 kΩ pull-up).
pub const DHT_DATA_GPIO: u8 = 13;

pub const I2C_SDA_GPIO: u8 = 21;
pub const I2C_SCL_GPIO: u8 = 22;

/// INA219 on the solar panel input (A0 = A1 = GND).
pub const INA_SOLAR_ADDR: u8 = 0x40;
/// INA219 on the battery line (A0 = A1 = VS).
pub const INA_BATTERY_ADDR: u8 = 0x45;

/// Highest GPIO number on the classic ESP32.
pub const MAX_GPIO: u8 = 39;

/// GPIOs usable as ext1 wake sources.
pub const RTC_GPIOS: [u8; 18] = [0, 2, 4, 12, 13, 14, 15, 25, 26, 27, 32, 33, 34, 35, 36, 37, 38, 39];

/// Whether `gpio` can wake the chip from deep sleep via ext1.
pub fn is_rtc_gpio(gpio: u8) -> bool {
    RTC_GPIOS.contains(&gpio)
}
