//! Mock adapters for integration tests.
//!
//! Every port the episode touches gets a scriptable in-memory stand-in, so
//! tests can drive levels, clock and link failures and assert on exactly
//! what reached the broker.

use std::cell::Cell;
use std::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use mailbox_sentinel::app::events::{AppEvent, EpisodeReport};
use mailbox_sentinel::app::ports::{ClockPort, EventSink, LinkPort, NetworkInfoPort, SensorPort};
use mailbox_sentinel::app::sampler::{AnalogInput, DigitalInput};
use mailbox_sentinel::app::service::AppService;
use mailbox_sentinel::app::state::ControllerState;
use mailbox_sentinel::config::SystemConfig;
use mailbox_sentinel::error::CommsError;
use mailbox_sentinel::wake::WakeCause;

// ── Sensors ───────────────────────────────────────────────────

pub struct MockSensors {
    pub letter: bool,
    pub parcel: bool,
    pub motion: bool,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub vbat_v: f32,
    pub solar_ma: f32,
    pub battery_ma: f32,
    pub reads: u32,
}

impl Default for MockSensors {
    fn default() -> Self {
        Self {
            letter: false,
            parcel: false,
            motion: false,
            temperature_c: 18.5,
            humidity_pct: 71.25,
            vbat_v: 4.02,
            solar_ma: 35.0,
            battery_ma: -12.5,
            reads: 0,
        }
    }
}

impl SensorPort for MockSensors {
    fn read_digital(&mut self, input: DigitalInput) -> bool {
        self.reads += 1;
        match input {
            DigitalInput::Letter => self.letter,
            DigitalInput::Parcel => self.parcel,
            DigitalInput::Motion => self.motion,
        }
    }

    fn read_analog(&mut self, input: AnalogInput) -> f32 {
        self.reads += 1;
        match input {
            AnalogInput::Temperature => self.temperature_c,
            AnalogInput::Humidity => self.humidity_pct,
            AnalogInput::BatteryVoltage => self.vbat_v,
            AnalogInput::SolarCurrent => self.solar_ma,
            AnalogInput::BatteryCurrent => self.battery_ma,
        }
    }
}

// ── Link ──────────────────────────────────────────────────────

pub struct MockLink {
    /// When `false`, `ensure_connected` fails with `WifiConnectFailed`.
    pub reachable: bool,
    pub connected: bool,
    pub connect_attempts: u32,
    /// Topics the broker refuses.
    pub refuse: Vec<&'static str>,
    pub published: Vec<(String, String)>,
}

impl Default for MockLink {
    fn default() -> Self {
        Self {
            reachable: true,
            connected: false,
            connect_attempts: 0,
            refuse: Vec::new(),
            published: Vec::new(),
        }
    }
}

#[allow(dead_code)]
impl MockLink {
    pub fn down() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    pub fn topics(&self) -> Vec<&str> {
        self.published.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn payload(&self, topic: &str) -> Option<&str> {
        self.published
            .iter()
            .rev()
            .find(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl LinkPort for MockLink {
    fn ensure_connected(&mut self) -> Result<(), CommsError> {
        if self.connected {
            return Ok(());
        }
        self.connect_attempts += 1;
        if !self.reachable {
            return Err(CommsError::WifiConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::BrokerConnectFailed);
        }
        if self.refuse.contains(&topic) {
            return Err(CommsError::PublishFailed);
        }
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

impl NetworkInfoPort for MockLink {
    fn rssi_dbm(&self) -> Option<i8> {
        self.connected.then_some(-67)
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.connected.then_some(Ipv4Addr::new(192, 168, 1, 50))
    }
}

// ── Clock, delay, sink ────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    pub now: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Counts requested delay instead of sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

/// One simulated board: service plus every mock port.
pub struct Bench {
    pub app: AppService,
    pub hw: MockSensors,
    pub link: MockLink,
    pub clock: MockClock,
    pub delay: NoDelay,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Bench {
    pub fn new(config: SystemConfig) -> Self {
        Self::resume(config, ControllerState::default())
    }

    /// Board woken with `state` carried over from a previous episode.
    pub fn resume(config: SystemConfig, state: ControllerState) -> Self {
        Self {
            app: AppService::new(config, state),
            hw: MockSensors::default(),
            link: MockLink::default(),
            clock: MockClock::at(1_000),
            delay: NoDelay::default(),
            sink: RecordingSink::default(),
        }
    }

    /// Every episode starts with the radio off, as after deep sleep.
    pub fn episode(&mut self, cause: WakeCause) -> EpisodeReport {
        self.link.connected = false;
        self.app.run_episode(
            cause,
            &mut self.hw,
            &mut self.link,
            &mut self.delay,
            &self.clock,
            &mut self.sink,
        )
    }

    /// Run an episode and return only what reached the broker during it.
    pub fn published_by(&mut self, cause: WakeCause) -> Vec<(String, String)> {
        self.link.clear();
        self.episode(cause);
        self.link.published.clone()
    }
}
