//! Error types shared by the sensor and messaging paths.
//!
//! Both are `Copy` so they can be passed through the publisher, the event
//! sink and the sensor hub without allocation.  Adapter-specific failures
//! (config, peripheral init, WiFi credentials) keep their own enums next
//! to the adapter, and the binary logs them and carries on with defaults.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not answer on the bus (absent or unpowered).
    NotFound,
    /// An I2C transaction failed.
    BusFailed,
    /// The device did not drive the expected edge in time.
    Timeout,
    /// Frame checksum mismatch.
    Checksum,
    /// ADC read returned an error.
    AdcReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "device not found"),
            Self::BusFailed => write!(f, "bus transaction failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// WiFi association failed or no credentials are configured.
    WifiConnectFailed,
    /// The broker session could not be established.
    BrokerConnectFailed,
    /// The link is up but the broker refused the message.
    PublishFailed,
    /// The link was given up for the rest of this episode.
    Deferred,
}

impl CommsError {
    /// `true` for failures of the link itself rather than of one message.
    pub const fn is_link_down(self) -> bool {
        matches!(self, Self::WifiConnectFailed | Self::BrokerConnectFailed)
    }
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::BrokerConnectFailed => write!(f, "MQTT broker connect failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::Deferred => write!(f, "link deferred to next episode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_down_classification() {
        assert!(CommsError::WifiConnectFailed.is_link_down());
        assert!(CommsError::BrokerConnectFailed.is_link_down());
        assert!(!CommsError::PublishFailed.is_link_down());
        assert!(!CommsError::Deferred.is_link_down());
    }

    #[test]
    fn display_names_the_failure() {
        assert_eq!(SensorError::Checksum.to_string(), "checksum mismatch");
        assert_eq!(CommsError::Deferred.to_string(), "link deferred to next episode");
    }
}
