//! Periodic telemetry: cadence check and payload formatting.
//!
//! One message per metric, in a fixed order.  Metrics that could not be
//! read this episode are left out; the others go through unaffected.

use core::fmt::Write;
use core::net::Ipv4Addr;

use crate::app::sampler::{AnalogInput, SensorSnapshot};
use crate::topics::Topic;
use crate::wake::WakeCause;

/// Room for any finite `f32` printed with two decimals.
pub type Payload = heapless::String<48>;

/// Maximum number of messages in one report.
pub const FRAME_LEN: usize = AnalogInput::ALL.len() + 2;

/// `true` if a telemetry report is due this episode.
///
/// A timer wake always reports.  Otherwise a report is due when none was
/// delivered since power-on or the cadence has strictly elapsed.
pub fn is_due(cause: &WakeCause, last_ms: Option<u64>, now_ms: u64, cadence_ms: u64) -> bool {
    if *cause == WakeCause::Timer {
        return true;
    }
    match last_ms {
        None => true,
        Some(at) => now_ms.saturating_sub(at) > cadence_ms,
    }
}

/// `"1"` / `"0"` payload for a digital channel.
pub const fn level_payload(level: bool) -> &'static str {
    if level { "1" } else { "0" }
}

/// Decimal with two fractional digits.  `None` for NaN or infinite values.
pub fn format_metric(value: f32) -> Option<Payload> {
    if !value.is_finite() {
        return None;
    }
    let mut out = Payload::new();
    write!(out, "{value:.2}").ok()?;
    Some(out)
}

/// Ordered telemetry messages for one report.
#[derive(Debug, Clone, Default)]
pub struct TelemetryFrame {
    entries: heapless::Vec<(Topic, Payload), FRAME_LEN>,
    skipped: heapless::Vec<AnalogInput, { AnalogInput::ALL.len() }>,
}

impl TelemetryFrame {
    /// Build the report from a snapshot and the link diagnostics.
    pub fn build(snapshot: &SensorSnapshot, rssi_dbm: Option<i8>, ip: Option<Ipv4Addr>) -> Self {
        let mut frame = Self::default();

        for input in AnalogInput::ALL {
            match format_metric(snapshot.analog(input)) {
                Some(payload) => frame.push(Topic::for_analog(input), payload),
                None => {
                    let _ = frame.skipped.push(input);
                }
            }
        }

        if let Some(rssi) = rssi_dbm {
            let mut payload = Payload::new();
            if write!(payload, "{rssi}").is_ok() {
                frame.push(Topic::Rssi, payload);
            }
        }
        if let Some(addr) = ip {
            let mut payload = Payload::new();
            if write!(payload, "{addr}").is_ok() {
                frame.push(Topic::Ip, payload);
            }
        }

        frame
    }

    fn push(&mut self, topic: Topic, payload: Payload) {
        // FRAME_LEN covers every topic exactly once.
        let _ = self.entries.push((topic, payload));
    }

    pub fn entries(&self) -> &[(Topic, Payload)] {
        &self.entries
    }

    /// Analog metrics left out because the read failed.
    pub fn skipped(&self) -> &[AnalogInput] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
