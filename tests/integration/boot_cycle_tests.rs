//! Several deep-sleep cycles through the simulated board adapters:
//! sleep controller, RTC memory and the MQTT link over simulated WiFi.

use mailbox_sentinel::adapters::mqtt::{BrokerSettings, MqttLink};
use mailbox_sentinel::adapters::power::SleepController;
use mailbox_sentinel::adapters::rtc_memory::RtcRetained;
use mailbox_sentinel::adapters::wifi::{ConnectivityPort, WifiAdapter};
use mailbox_sentinel::app::ports::{PowerPort, RetainedPort};
use mailbox_sentinel::app::service::AppService;
use mailbox_sentinel::config::{SystemConfig, bounded};
use mailbox_sentinel::wake::{self, RawWakeSource, TimerPurpose, WakeCause, WakePlan};

use super::mock_hw::{MockClock, MockSensors, NoDelay, RecordingSink};

struct Board {
    config: SystemConfig,
    power: SleepController,
    rtc: RtcRetained,
    hw: MockSensors,
    link: MqttLink<WifiAdapter>,
    clock: MockClock,
}

impl Board {
    fn new() -> Self {
        let config = SystemConfig::default();
        let mut wifi = WifiAdapter::new();
        wifi.set_credentials("HomeNet", "password1").unwrap();
        let link = MqttLink::new(wifi, BrokerSettings::from_config(&config, bounded("box-test")));
        Self {
            config,
            power: SleepController::new(),
            rtc: RtcRetained::new(),
            hw: MockSensors::default(),
            link,
            clock: MockClock::at(10_000),
        }
    }

    /// One boot: classify, run the episode, retain, sleep.
    fn boot(&mut self, source: RawWakeSource) -> (WakeCause, Vec<(String, String)>) {
        self.power.sim_set_source(source);
        let retained = self.rtc.load();
        let cause = wake::classify(self.power.wake_source(), retained.as_ref(), &self.config.pin_map());

        let mut app = AppService::new(self.config.clone(), retained.unwrap_or_default());
        self.link.sim().published.clear();
        let report = app.run_episode(
            cause.clone(),
            &mut self.hw,
            &mut self.link,
            &mut NoDelay::default(),
            &self.clock,
            &mut RecordingSink::default(),
        );
        self.rtc.store(app.state());
        self.link.shutdown();
        self.power.enter_low_power(&report.plan);

        (cause, self.link.sim().published.clone())
    }

    fn last_plan(&self) -> WakePlan {
        *self.power.sim_plans().last().unwrap()
    }
}

#[test]
fn letter_delivery_over_three_boots() {
    let mut board = Board::new();

    // Power-on: full report, everything low, timer for the next report.
    let (cause, published) = board.boot(RawWakeSource::Undefined);
    assert_eq!(cause, WakeCause::ColdBoot);
    assert_eq!(published.len(), 7);
    assert!(matches!(
        board.last_plan(),
        WakePlan::DeepSleep { timer: Some(t), .. } if t.purpose == TimerPurpose::Telemetry
    ));

    // Flap opens: ext1 on the letter pin.
    board.hw.letter = true;
    board.clock.advance(60_000);
    let (cause, published) = board.boot(RawWakeSource::Ext1 {
        mask: 1 << board.config.pin_letter,
    });
    assert!(matches!(cause, WakeCause::PinSignal { .. }));
    assert_eq!(published, vec![("mailbox/letter".to_string(), "1".to_string())]);
    let letter_bit = 1u64 << board.config.pin_letter;
    assert!(matches!(
        board.last_plan(),
        WakePlan::DeepSleep { pin_mask, timer: Some(t) }
            if pin_mask & letter_bit == 0 && t.purpose == TimerPurpose::Recheck
    ));

    // Recheck timer fires after the flap closed.
    board.hw.letter = false;
    board.clock.advance(1_000);
    let (cause, published) = board.boot(RawWakeSource::Timer);
    assert_eq!(cause, WakeCause::Poll);
    assert_eq!(published, vec![("mailbox/letter".to_string(), "0".to_string())]);
    assert!(matches!(
        board.last_plan(),
        WakePlan::DeepSleep { pin_mask, .. } if pin_mask & letter_bit != 0
    ));
}

#[test]
fn cadence_timer_forces_report() {
    let mut board = Board::new();
    board.boot(RawWakeSource::Undefined);

    board.clock.advance(600_000);
    let (cause, published) = board.boot(RawWakeSource::Timer);
    assert_eq!(cause, WakeCause::Timer);
    assert_eq!(published.len(), 7);
}

#[test]
fn lost_rtc_memory_is_a_cold_boot() {
    let mut board = Board::new();
    board.boot(RawWakeSource::Undefined);
    board.rtc.sim_corrupt(12);

    board.clock.advance(1_000);
    let (cause, published) = board.boot(RawWakeSource::Ext1 { mask: 1 << 15 });
    assert_eq!(cause, WakeCause::ColdBoot);
    // No telemetry timestamp survived: report again.
    assert_eq!(published.len(), 7);
}

#[test]
fn broker_outage_keeps_edge_for_next_boot() {
    let mut board = Board::new();
    board.boot(RawWakeSource::Undefined);

    board.link.sim().reachable = false;
    board.hw.parcel = true;
    board.clock.advance(5_000);
    let (_, published) = board.boot(RawWakeSource::Ext1 { mask: 1 << 15 });
    assert!(published.is_empty());

    board.link.sim().reachable = true;
    board.clock.advance(1_000);
    let (_, published) = board.boot(RawWakeSource::Timer);
    assert_eq!(published[0], ("mailbox/parcel".to_string(), "1".to_string()));
}
