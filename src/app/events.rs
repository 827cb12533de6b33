//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the firmware logs them to serial.

use crate::error::CommsError;
use crate::telemetry::Payload;
use crate::topics::Topic;
use crate::wake::{WakeCause, WakePlan};

use super::sampler::AnalogInput;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A wake episode began.
    EpisodeStarted { boot_count: u32, cause: WakeCause },

    /// A message reached the broker.
    Published { topic: Topic, payload: Payload },

    /// A message was given up after the retry budget.
    PublishFailed { topic: Topic, error: CommsError },

    /// The link could not be brought up for the telemetry report.
    ConnectFailed(CommsError),

    /// A due telemetry metric was not readable this episode.
    MetricSkipped(AnalogInput),

    /// The link could not be brought up; remaining publishes wait for the
    /// next episode.
    LinkDeferred,

    /// A sensor failed to initialise and will read as unavailable.
    SensorUnavailable(&'static str),

    /// The episode is over.
    EpisodeFinished(EpisodeReport),
}

/// Summary of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeReport {
    pub boot_count: u32,
    pub published: u8,
    pub failed: u8,
    pub telemetry_sent: bool,
    pub deferred: bool,
    pub plan: WakePlan,
}
