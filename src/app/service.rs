//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the configuration and the retained
//! [`ControllerState`].  One call to [`AppService::run_episode`] is one
//! wake episode: sample, decide, publish, plan the next wake.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AppService        │
//!    LinkPort ◀──│ channels · telemetry    │ ──▶ WakePlan
//!                 └────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::{SystemConfig, bounded};
use crate::telemetry::{self, TelemetryFrame, level_payload};
use crate::topics::Topic;
use crate::wake::{self, WakeCause};

use super::events::{AppEvent, EpisodeReport};
use super::ports::{ClockPort, EventSink, LinkPort, NetworkInfoPort, SensorPort};
use super::publisher::Publisher;
use super::sampler::{DigitalInput, Sampler, SensorSnapshot};
use super::state::ControllerState;

/// What the episode has to transmit, decided before touching the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Switch edges to publish, in input order.
    pub switch_edges: heapless::Vec<(DigitalInput, bool), 2>,
    /// Motion trigger (`true`) or reset (`false`).
    pub motion: Option<bool>,
    pub telemetry_due: bool,
}

impl Decision {
    pub fn is_quiet(&self) -> bool {
        self.switch_edges.is_empty() && self.motion.is_none() && !self.telemetry_due
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    state: ControllerState,
}

impl AppService {
    /// Resume from the state retained by the previous episode.
    pub fn new(config: SystemConfig, state: ControllerState) -> Self {
        Self { config, state }
    }

    // ── Pure core ─────────────────────────────────────────────

    /// Fold one snapshot into the channel state and decide what to send.
    ///
    /// The motion state machine advances here.  Every `last_published`
    /// level and the telemetry timestamp are left alone: they only move
    /// once the broker has the message.
    pub fn decide(&mut self, cause: &WakeCause, snapshot: &SensorSnapshot, now_ms: u64) -> Decision {
        self.state.boot_count = self.state.boot_count.wrapping_add(1);

        let mut switch_edges = heapless::Vec::new();
        for input in [DigitalInput::Letter, DigitalInput::Parcel] {
            if let Some(channel) = self.state.switch_mut(input) {
                if let Some(level) = channel.observe(snapshot.digital(input)) {
                    let _ = switch_edges.push((input, level));
                }
            }
        }

        self.state
            .motion
            .observe(snapshot.motion, now_ms, self.config.debounce_ms);
        let motion = self.state.motion.pending();

        let telemetry_due = telemetry::is_due(
            cause,
            self.state.last_telemetry_ms,
            now_ms,
            self.config.cadence_ms(),
        );

        Decision {
            switch_edges,
            motion,
            telemetry_due,
        }
    }

    // ── Episode orchestration ─────────────────────────────────

    /// Run one wake episode end to end.
    ///
    /// Never fails: publish errors are reported through `sink` and leave
    /// the affected state pending for the next episode.  The caller
    /// persists [`state`](Self::state) and hands the returned plan to the
    /// power port.
    pub fn run_episode<L>(
        &mut self,
        cause: WakeCause,
        hw: &mut impl SensorPort,
        link: &mut L,
        delay: &mut impl DelayNs,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> EpisodeReport
    where
        L: LinkPort + NetworkInfoPort,
    {
        sink.emit(&AppEvent::EpisodeStarted {
            boot_count: self.state.boot_count.wrapping_add(1),
            cause: cause.clone(),
        });

        let snapshot = Sampler::sample(hw);
        let now_ms = clock.now_ms();
        let decision = self.decide(&cause, &snapshot, now_ms);
        debug!("episode decision: {:?}", decision);

        let mut publisher = Publisher::new(link, delay, &self.config);
        let mut tally = Tally::default();

        for &(input, level) in &decision.switch_edges {
            let topic = Topic::for_digital(input);
            if tally.send(&mut publisher, sink, topic, level_payload(level)) {
                if let Some(channel) = self.state.switch_mut(input) {
                    channel.commit(level);
                }
            }
        }

        if let Some(level) = decision.motion {
            if tally.send(&mut publisher, sink, Topic::Motion, level_payload(level)) {
                self.state.motion.commit(level);
            }
        }

        let mut telemetry_sent = false;
        if decision.telemetry_due && !publisher.is_deferred() {
            // Bring the link up first so RSSI and address are available.
            if let Err(error) = publisher.connect() {
                sink.emit(&AppEvent::ConnectFailed(error));
            }
            let link = publisher.link();
            let frame = TelemetryFrame::build(&snapshot, link.rssi_dbm(), link.local_ip());

            for input in frame.skipped() {
                sink.emit(&AppEvent::MetricSkipped(*input));
            }
            for (topic, payload) in frame.entries() {
                telemetry_sent |= tally.send(&mut publisher, sink, *topic, payload);
            }
            if telemetry_sent {
                self.state.last_telemetry_ms = Some(now_ms);
            }
        }

        let deferred = publisher.is_deferred();
        if deferred {
            sink.emit(&AppEvent::LinkDeferred);
        }

        let plan = wake::plan_wake(&self.config, &self.state, &snapshot, clock.now_ms());
        self.state.armed_timer = plan.timer_purpose();

        let report = EpisodeReport {
            boot_count: self.state.boot_count,
            published: tally.published,
            failed: tally.failed,
            telemetry_sent,
            deferred,
            plan,
        };
        info!(
            "episode #{} ({}) done: {} sent, {} failed",
            report.boot_count,
            cause.label(),
            report.published,
            report.failed
        );
        sink.emit(&AppEvent::EpisodeFinished(report));
        report
    }

    // ── Queries ───────────────────────────────────────────────

    /// State to retain for the next episode.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}

/// Publish counters for the episode report.
#[derive(Default)]
struct Tally {
    published: u8,
    failed: u8,
}

impl Tally {
    fn send<L: LinkPort, D: DelayNs>(
        &mut self,
        publisher: &mut Publisher<'_, L, D>,
        sink: &mut impl EventSink,
        topic: Topic,
        payload: &str,
    ) -> bool {
        match publisher.publish(topic, payload) {
            Ok(()) => {
                self.published = self.published.saturating_add(1);
                sink.emit(&AppEvent::Published {
                    topic,
                    payload: bounded(payload),
                });
                true
            }
            Err(error) => {
                self.failed = self.failed.saturating_add(1);
                sink.emit(&AppEvent::PublishFailed { topic, error });
                false
            }
        }
    }
}
