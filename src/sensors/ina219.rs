//! INA219 high-side current monitor (I2C).
//!
//! Two of these share one bus: one on the solar panel input, one on the
//! battery line.  The driver does not own the bus; every call takes it by
//! `&mut` so both monitors can be driven from the same [`I2c`] instance.
//!
//! Calibration matches a 0.1 Ω shunt, 32 V bus range, ±3.2 A:
//! current LSB = 0.1 mA, calibration register = 4096.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

const REG_CONFIG: u8 = 0x00;
const REG_CURRENT: u8 = 0x04;
const REG_CALIBRATION: u8 = 0x05;

/// BRNG=32 V, PGA=/8 (320 mV), 12-bit bus and shunt ADC, continuous.
const CONFIG_32V_2A: u16 = 0x399F;
const CALIBRATION_32V_2A: u16 = 4096;
/// Current register counts per mA at the calibration above.
const COUNTS_PER_MA: f32 = 10.0;

/// Convert the signed current register to mA.
pub fn current_from_register(raw: u16) -> f32 {
    f32::from(raw as i16) / COUNTS_PER_MA
}

pub struct Ina219 {
    addr: u8,
}

impl Ina219 {
    pub fn new(addr: u8) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Probe the device and load configuration and calibration.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        self.read_register(i2c, REG_CONFIG)
            .map_err(|_| SensorError::NotFound)?;
        self.write_register(i2c, REG_CONFIG, CONFIG_32V_2A)?;
        self.write_register(i2c, REG_CALIBRATION, CALIBRATION_32V_2A)
    }

    /// Signed current through the shunt in mA.
    pub fn read_current_ma<I: I2c>(&mut self, i2c: &mut I) -> Result<f32, SensorError> {
        // A brown-out resets the calibration register to zero, after which
        // the current register reads zero forever.  Rewrite it each time.
        self.write_register(i2c, REG_CALIBRATION, CALIBRATION_32V_2A)?;
        let raw = self.read_register(i2c, REG_CURRENT)?;
        Ok(current_from_register(raw))
    }

    fn write_register<I: I2c>(&self, i2c: &mut I, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        i2c.write(self.addr, &[reg, hi, lo])
            .map_err(|_| SensorError::BusFailed)
    }

    fn read_register<I: I2c>(&self, i2c: &mut I, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        i2c.write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(u16::from_be_bytes(buf))
    }
}
