//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one line per application event to
//! the ESP-IDF logger (UART in production).  Failures go out at `warn`,
//! everything else at `info`.

use core::fmt::Write;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::wake::{WakeCause, WakePlan};

pub type LogLine = heapless::String<160>;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn is_failure(event: &AppEvent) -> bool {
    matches!(
        event,
        AppEvent::PublishFailed { .. }
            | AppEvent::ConnectFailed(_)
            | AppEvent::LinkDeferred
            | AppEvent::SensorUnavailable(_)
            | AppEvent::MetricSkipped(_)
    )
}

/// Format one event as a `KIND | detail` line.  Over-long lines are cut.
pub fn render(event: &AppEvent) -> LogLine {
    let mut line = LogLine::new();
    let _ = match event {
        AppEvent::EpisodeStarted { boot_count, cause } => {
            let _ = write!(line, "EPISODE | #{} cause={}", boot_count, cause.label());
            if let WakeCause::PinSignal { inputs } = cause {
                for input in inputs {
                    let _ = write!(line, " {:?}", input);
                }
            }
            Ok(())
        }
        AppEvent::Published { topic, payload } => {
            write!(line, "PUBLISH | {} = {}", topic, payload)
        }
        AppEvent::PublishFailed { topic, error } => {
            write!(line, "PUBLISH | {} failed: {}", topic, error)
        }
        AppEvent::MetricSkipped(input) => write!(line, "METRIC | {:?} unavailable", input),
        AppEvent::ConnectFailed(error) => write!(line, "LINK | connect failed: {}", error),
        AppEvent::LinkDeferred => write!(line, "LINK | deferred to next episode"),
        AppEvent::SensorUnavailable(name) => write!(line, "SENSOR | {} not responding", name),
        AppEvent::EpisodeFinished(r) => {
            let _ = write!(
                line,
                "DONE | #{} published={} failed={} telemetry={}",
                r.boot_count, r.published, r.failed, r.telemetry_sent
            );
            match r.plan {
                WakePlan::DeepSleep { pin_mask, timer } => {
                    let _ = write!(line, " sleep mask=0x{:x}", pin_mask);
                    if let Some(t) = timer {
                        let _ = write!(line, " timer={}ms({:?})", t.after_ms, t.purpose);
                    }
                }
                WakePlan::Stay { poll_ms } => {
                    let _ = write!(line, " stay {}ms", poll_ms);
                }
            }
            Ok(())
        }
    };
    line
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let line = render(event);
        if is_failure(event) {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }
}
