//! End-to-end episode scenarios: sample → decide → publish → plan.

use mailbox_sentinel::app::events::AppEvent;
use mailbox_sentinel::app::sampler::{AnalogInput, DigitalInput};
use mailbox_sentinel::app::state::ControllerState;
use mailbox_sentinel::config::{RunMode, SystemConfig};
use mailbox_sentinel::drivers::watchdog;
use mailbox_sentinel::error::CommsError;
use mailbox_sentinel::wake::{TimerPurpose, WakeCause, WakePlan};

use super::mock_hw::Bench;

const TELEMETRY_TOPICS: [&str; 7] = [
    "mailbox/temperature",
    "mailbox/humidity",
    "mailbox/vbat",
    "mailbox/icsolaire",
    "mailbox/icbatterie",
    "mailbox/rssi",
    "mailbox/ip",
];

fn pin(input: DigitalInput) -> WakeCause {
    let mut inputs = heapless::Vec::new();
    inputs.push(input).unwrap();
    WakeCause::PinSignal { inputs }
}

/// A board whose last telemetry report was just delivered.
fn fresh_report_bench() -> Bench {
    let state = ControllerState {
        last_telemetry_ms: Some(1_000),
        ..Default::default()
    };
    Bench::resume(SystemConfig::default(), state)
}

fn pair(topic: &str, payload: &str) -> (String, String) {
    (topic.to_string(), payload.to_string())
}

// ── Switch channels ───────────────────────────────────────────

#[test]
fn letter_edge_publishes_only_the_letter() {
    let mut bench = fresh_report_bench();
    bench.hw.letter = true;

    let published = bench.published_by(pin(DigitalInput::Letter));

    assert_eq!(published, vec![pair("mailbox/letter", "1")]);
}

#[test]
fn held_switch_is_not_republished() {
    let mut bench = fresh_report_bench();
    bench.hw.parcel = true;

    assert_eq!(bench.published_by(pin(DigitalInput::Parcel)).len(), 1);
    bench.clock.advance(1_000);
    assert!(bench.published_by(WakeCause::Poll).is_empty());

    bench.hw.parcel = false;
    bench.clock.advance(1_000);
    assert_eq!(
        bench.published_by(WakeCause::Poll),
        vec![pair("mailbox/parcel", "0")]
    );
}

#[test]
fn refused_switch_publish_is_retried_next_episode() {
    let mut bench = fresh_report_bench();
    bench.hw.letter = true;
    bench.link.refuse.push("mailbox/letter");

    let report = bench.episode(pin(DigitalInput::Letter));
    assert_eq!(report.failed, 1);
    assert!(!bench.app.state().letter.last_published);
    assert!(!report.deferred, "a refused message does not defer the link");

    bench.link.refuse.clear();
    bench.clock.advance(1_000);
    assert_eq!(
        bench.published_by(WakeCause::Poll),
        vec![pair("mailbox/letter", "1")]
    );
    assert!(bench.app.state().letter.last_published);
}

#[test]
fn both_switches_in_one_episode() {
    let mut bench = fresh_report_bench();
    bench.hw.letter = true;
    bench.hw.parcel = true;

    let published = bench.published_by(WakeCause::Poll);

    assert_eq!(
        published,
        vec![pair("mailbox/letter", "1"), pair("mailbox/parcel", "1")]
    );
}

// ── Motion channel ────────────────────────────────────────────

#[test]
fn motion_trigger_debounce_and_reset() {
    let mut bench = fresh_report_bench();

    bench.hw.motion = true;
    assert_eq!(
        bench.published_by(pin(DigitalInput::Motion)),
        vec![pair("mailbox/pir", "1")]
    );

    bench.clock.advance(500);
    assert!(bench.published_by(WakeCause::Poll).is_empty());

    bench.hw.motion = false;
    bench.clock.advance(500);
    assert_eq!(
        bench.published_by(WakeCause::Poll),
        vec![pair("mailbox/pir", "0")]
    );
    assert!(!bench.app.state().motion.impulse_latched);

    // Window from the first trigger has passed: a new trigger is allowed.
    bench.hw.motion = true;
    bench.clock.advance(1_500);
    assert_eq!(
        bench.published_by(pin(DigitalInput::Motion)),
        vec![pair("mailbox/pir", "1")]
    );
}

#[test]
fn motion_retrigger_inside_window_is_held() {
    let mut bench = fresh_report_bench();

    bench.hw.motion = true;
    bench.episode(pin(DigitalInput::Motion));
    bench.hw.motion = false;
    bench.clock.advance(300);
    bench.episode(WakeCause::Poll);

    bench.hw.motion = true;
    bench.clock.advance(300);
    assert!(bench.published_by(pin(DigitalInput::Motion)).is_empty());
}

#[test]
fn refused_motion_trigger_is_retried_while_latched() {
    let mut bench = fresh_report_bench();
    bench.hw.motion = true;
    bench.link.refuse.push("mailbox/pir");
    bench.episode(pin(DigitalInput::Motion));
    assert!(bench.link.published.is_empty());

    bench.link.refuse.clear();
    bench.clock.advance(1_000);
    assert_eq!(
        bench.published_by(WakeCause::Poll),
        vec![pair("mailbox/pir", "1")]
    );
}

#[test]
fn undelivered_trigger_leaves_no_reset_behind() {
    let mut bench = fresh_report_bench();
    bench.hw.motion = true;
    bench.link.refuse.push("mailbox/pir");
    bench.episode(pin(DigitalInput::Motion));

    // The area clears before the broker ever took the trigger.
    bench.link.refuse.clear();
    bench.hw.motion = false;
    bench.clock.advance(1_000);
    assert!(bench.published_by(WakeCause::Poll).is_empty());
    assert_eq!(bench.app.state().motion.pending(), None);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn cold_boot_reports_everything() {
    let mut bench = Bench::new(SystemConfig::default());

    let report = bench.episode(WakeCause::ColdBoot);

    assert!(report.telemetry_sent);
    assert_eq!(bench.link.topics(), TELEMETRY_TOPICS);
    assert_eq!(bench.link.payload("mailbox/temperature"), Some("18.50"));
    assert_eq!(bench.link.payload("mailbox/icbatterie"), Some("-12.50"));
    assert_eq!(bench.link.payload("mailbox/rssi"), Some("-67"));
    assert_eq!(bench.link.payload("mailbox/ip"), Some("192.168.1.50"));
    assert_eq!(bench.app.state().last_telemetry_ms, Some(1_000));
}

#[test]
fn timer_wake_skips_unreadable_temperature() {
    let mut bench = fresh_report_bench();
    bench.hw.temperature_c = f32::NAN;

    let report = bench.episode(WakeCause::Timer);

    assert!(report.telemetry_sent);
    let topics = bench.link.topics();
    assert!(!topics.contains(&"mailbox/temperature"));
    assert_eq!(topics.len(), TELEMETRY_TOPICS.len() - 1);
    assert_eq!(
        bench
            .sink
            .count(|e| matches!(e, AppEvent::MetricSkipped(AnalogInput::Temperature))),
        1
    );
}

#[test]
fn telemetry_respects_cadence() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.episode(WakeCause::ColdBoot);

    let cadence = SystemConfig::default().cadence_ms();
    bench.clock.advance(cadence);
    assert!(bench.published_by(WakeCause::Poll).is_empty(), "cadence is strict");

    bench.clock.advance(1);
    assert_eq!(bench.published_by(WakeCause::Poll).len(), TELEMETRY_TOPICS.len());
}

#[test]
fn every_input_sampled_once_per_episode() {
    let mut bench = fresh_report_bench();
    bench.episode(WakeCause::Poll);
    assert_eq!(bench.hw.reads, 8);
}

// ── Link failure ──────────────────────────────────────────────

#[test]
fn unreachable_link_defers_and_keeps_everything_pending() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.link.reachable = false;
    bench.hw.letter = true;
    bench.hw.motion = true;

    let report = bench.episode(WakeCause::ColdBoot);

    assert!(report.deferred);
    assert!(!report.telemetry_sent);
    assert_eq!(
        bench.link.connect_attempts,
        u32::from(SystemConfig::default().publish_max_attempts),
        "only the first message spends the retry budget"
    );
    assert!(!bench.app.state().letter.last_published);
    assert_eq!(bench.app.state().last_telemetry_ms, None);
    assert_eq!(
        bench.sink.count(|e| matches!(
            e,
            AppEvent::PublishFailed {
                error: CommsError::Deferred,
                ..
            }
        )),
        1,
        "motion fails fast once deferred"
    );
    assert_eq!(bench.sink.count(|e| matches!(e, AppEvent::LinkDeferred)), 1);

    // Retry delay is spent between attempts, never after the last one.
    let expected_ms = u64::from(SystemConfig::default().publish_retry_delay_ms)
        * u64::from(SystemConfig::default().publish_max_attempts - 1);
    assert_eq!(bench.delay.total_ns, expected_ms * 1_000_000);

    // Next episode the broker is back: the letter edge, the still-latched
    // motion trigger and telemetry go out.
    bench.link.reachable = true;
    bench.clock.advance(5_000);
    let published = bench.published_by(WakeCause::Poll);
    assert_eq!(published[0], pair("mailbox/letter", "1"));
    assert_eq!(published[1], pair("mailbox/pir", "1"));
    assert_eq!(published.len(), 2 + TELEMETRY_TOPICS.len());
}

#[test]
fn refusing_broker_defers_within_the_watchdog_budget() {
    let config = SystemConfig::default();
    let mut bench = Bench::new(config.clone());
    bench.hw.letter = true;
    bench.hw.parcel = true;
    bench.hw.motion = true;
    bench.link.refuse = vec!["mailbox/letter", "mailbox/parcel", "mailbox/pir"];
    bench.link.refuse.extend(TELEMETRY_TOPICS);

    let report = bench.episode(WakeCause::ColdBoot);

    assert!(report.deferred);
    assert!(bench.link.published.is_empty());
    // Letter and parcel spend the budget, motion fails fast, telemetry is
    // not attempted.
    assert_eq!(report.failed, 3);
    assert!(!report.telemetry_sent);

    let retry_delay_ms = u64::from(config.publish_retry_delay_ms)
        * u64::from(config.publish_max_attempts - 1)
        * 2;
    assert_eq!(bench.delay.total_ns, retry_delay_ms * 1_000_000);
    assert!(retry_delay_ms < u64::from(watchdog::episode_timeout_ms(&config)));

    let state = bench.app.state();
    assert!(!state.letter.last_published);
    assert!(!state.parcel.last_published);
    assert_eq!(state.motion.pending(), Some(true));
    assert_eq!(state.last_telemetry_ms, None);
}

#[test]
fn failed_telemetry_connect_is_reported() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.link.reachable = false;

    let report = bench.episode(WakeCause::Timer);

    assert!(report.deferred);
    assert_eq!(
        bench.sink.count(|e| matches!(e, AppEvent::ConnectFailed(CommsError::WifiConnectFailed))),
        1
    );
    // No RSSI or address without a link; the five sensor metrics fail fast.
    assert_eq!(
        bench.sink.count(|e| matches!(
            e,
            AppEvent::PublishFailed {
                error: CommsError::Deferred,
                ..
            }
        )),
        TELEMETRY_TOPICS.len() - 2
    );
}

// ── Wake planning ─────────────────────────────────────────────

#[test]
fn high_input_is_left_out_of_the_mask() {
    let mut bench = fresh_report_bench();
    bench.hw.letter = true;

    let report = bench.episode(pin(DigitalInput::Letter));

    let cfg = SystemConfig::default();
    match report.plan {
        WakePlan::DeepSleep { pin_mask, timer } => {
            assert_eq!(pin_mask & (1 << cfg.pin_letter), 0);
            assert_ne!(pin_mask & (1 << cfg.pin_parcel), 0);
            assert_ne!(pin_mask & (1 << cfg.pin_motion), 0);
            assert_eq!(timer.map(|t| t.purpose), Some(TimerPurpose::Recheck));
        }
        other => panic!("unexpected plan {other:?}"),
    }
    assert_eq!(bench.app.state().armed_timer, Some(TimerPurpose::Recheck));
}

#[test]
fn quiet_board_sleeps_until_next_report() {
    let mut bench = fresh_report_bench();
    bench.clock.advance(100_000);

    let report = bench.episode(WakeCause::Poll);

    match report.plan {
        WakePlan::DeepSleep { timer: Some(t), .. } => {
            assert_eq!(t.purpose, TimerPurpose::Telemetry);
            assert_eq!(t.after_ms, 600_000 - 100_000);
        }
        other => panic!("unexpected plan {other:?}"),
    }
}

#[test]
fn continuous_mode_stays_awake() {
    let cfg = SystemConfig {
        run_mode: RunMode::Continuous,
        ..SystemConfig::default()
    };
    let mut bench = Bench::new(cfg);

    let report = bench.episode(WakeCause::ColdBoot);

    assert_eq!(report.plan, WakePlan::Stay { poll_ms: 200 });
    assert_eq!(bench.app.state().armed_timer, None);
}
