//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, messaging link, sleep controller, retained
//! memory, event sinks, storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the episode logic never touches hardware directly.

use core::net::Ipv4Addr;

use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::wake::{RawWakeSource, WakePlan};

use super::sampler::{AnalogInput, DigitalInput};
use super::state::ControllerState;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sampler calls this to obtain sensor data.
pub trait SensorPort {
    /// Current logic level of a wake input.  Always succeeds.
    fn read_digital(&mut self, input: DigitalInput) -> bool;

    /// Current measured value.  `NaN` signals a transient read failure.
    fn read_analog(&mut self, input: AnalogInput) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Messaging link (driven adapter: domain → WiFi + MQTT)
// ───────────────────────────────────────────────────────────────

/// Publish capability over the messaging link.
///
/// Implementations own the WiFi association and the broker session.
/// Neither call may block indefinitely: the
/// [`Publisher`](super::publisher::Publisher) owns the retry policy.
pub trait LinkPort {
    /// Bring the link up if it is down.  No-op when already connected.
    fn ensure_connected(&mut self) -> Result<(), CommsError>;

    /// Publish one UTF-8 payload, QoS 0, not retained.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;
}

/// Network diagnostics reported with telemetry.
pub trait NetworkInfoPort {
    /// Signal strength of the associated AP in dBm.
    fn rssi_dbm(&self) -> Option<i8>;

    /// Address assigned by DHCP.
    fn local_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Millisecond clock that keeps counting through deep sleep.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Retained memory (survives deep sleep, lost on power loss)
// ───────────────────────────────────────────────────────────────

pub trait RetainedPort {
    /// The state stored by the previous episode, if the region is intact.
    fn load(&self) -> Option<ControllerState>;

    /// Overwrite the retained region.
    fn store(&mut self, state: &ControllerState);
}

// ───────────────────────────────────────────────────────────────
// Power management
// ───────────────────────────────────────────────────────────────

pub trait PowerPort {
    /// What the chip reports as the reason for this boot.
    fn wake_source(&self) -> RawWakeSource;

    /// Arm the wake sources in `plan` and enter the low-power state.
    ///
    /// On hardware a deep-sleep plan never returns.  Simulation adapters
    /// return so the harness can continue.
    fn enter_low_power(&mut self, plan: &WakePlan);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
