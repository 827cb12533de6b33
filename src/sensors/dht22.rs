//! DHT22 (AM2302) temperature / humidity sensor on a single-wire bus.
//!
//! ```text
//!  host   ‾‾‾‾\____ ≥1 ms ____/‾‾‾‾‾
//!  sensor                        \_80µs_/‾80µs‾\  40 bits
//!  bit    \_50µs_/‾26–28µs‾  = 0      \_50µs_/‾70µs‾ = 1
//! ```
//!
//! The frame is 5 bytes: humidity ×10, temperature ×10 (sign in bit 15),
//! checksum.  Decoding is split from the bit-banging so it can be tested
//! on the host.  The data pin must be open drain with a pull-up, driven
//! through both `OutputPin` and `InputPin`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Longest any level lasts in a valid transaction, in µs.
const EDGE_TIMEOUT_US: u32 = 100;
/// Sample point after the rising edge of a bit; a `1` is still high here.
const BIT_SAMPLE_US: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode a 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<DhtReading, SensorError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]);
    let temp_raw = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
    let mut temperature = f32::from(temp_raw) / 10.0;
    if frame[2] & 0x80 != 0 {
        temperature = -temperature;
    }

    Ok(DhtReading {
        temperature_c: temperature,
        humidity_pct: f32::from(humidity) / 10.0,
    })
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take the data pin and leave the bus idle (high).
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self { pin, delay }
    }

    /// Run one conversion.
    pub fn read(&mut self) -> Result<DhtReading, SensorError> {
        // Start signal.
        self.pin.set_low().map_err(|_| SensorError::BusFailed)?;
        self.delay.delay_us(1_100);
        self.pin.set_high().map_err(|_| SensorError::BusFailed)?;

        // Response: low 80 µs, high 80 µs.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_for(true)?;
            self.delay.delay_us(BIT_SAMPLE_US);
            let one = self.pin.is_high().map_err(|_| SensorError::BusFailed)?;
            if one {
                frame[bit / 8] |= 0x80 >> (bit % 8);
                self.wait_for(false)?;
            }
        }

        decode_frame(frame)
    }

    /// Busy-wait until the line reaches `high`.
    fn wait_for(&mut self, high: bool) -> Result<(), SensorError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high().map_err(|_| SensorError::BusFailed)? == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(SensorError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_positive_reading() {
        // 65.2 %RH, 35.1 °C
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        let r = decode_frame(frame).unwrap();
        assert!((r.humidity_pct - 65.2).abs() < 1e-4);
        assert!((r.temperature_c - 35.1).abs() < 1e-4);
    }

    #[test]
    fn decodes_negative_temperature() {
        // 40.0 %RH, -10.1 °C
        let body = [0x01, 0x90, 0x80, 0x65];
        let sum = body.iter().fold(0u8, |a, b| a.wrapping_add(*b));
        let r = decode_frame([body[0], body[1], body[2], body[3], sum]).unwrap();
        assert!((r.temperature_c + 10.1).abs() < 1e-4);
        assert!((r.humidity_pct - 40.0).abs() < 1e-4);
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEF];
        assert_eq!(decode_frame(frame), Err(SensorError::Checksum));
    }

    /// A line that never answers the start signal.
    struct DeadLine;

    impl embedded_hal::digital::ErrorType for DeadLine {
        type Error = core::convert::Infallible;
    }
    impl OutputPin for DeadLine {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }
    impl InputPin for DeadLine {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    struct NoDelay;
    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn missing_sensor_times_out() {
        let mut dht = Dht22::new(DeadLine, NoDelay);
        assert_eq!(dht.read(), Err(SensorError::Timeout));
    }
}
