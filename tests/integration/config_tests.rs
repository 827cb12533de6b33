//! Stored config overrides flowing through to episode behaviour.

use mailbox_sentinel::adapters::nvs::NvsAdapter;
use mailbox_sentinel::app::ports::{ConfigError, ConfigPort};
use mailbox_sentinel::app::sampler::DigitalInput;
use mailbox_sentinel::app::state::ControllerState;
use mailbox_sentinel::config::SystemConfig;
use mailbox_sentinel::wake::{self, RawWakeSource, WakeCause, WakePlan};

use super::mock_hw::Bench;

fn load(json: &str) -> Result<SystemConfig, ConfigError> {
    let nvs = NvsAdapter::new().unwrap();
    nvs.sim_put_raw(json.as_bytes());
    nvs.load()
}

#[test]
fn moved_letter_pin_changes_mask_and_classification() {
    let cfg = load(r#"{"pin_letter": 26}"#).unwrap();
    assert_eq!(cfg.pin_parcel, SystemConfig::default().pin_parcel);

    let cause = wake::classify(
        RawWakeSource::Ext1 { mask: 1 << 26 },
        Some(&ControllerState::default()),
        &cfg.pin_map(),
    );
    assert_eq!(
        cause,
        WakeCause::PinSignal {
            inputs: heapless::Vec::from_slice(&[DigitalInput::Letter]).unwrap()
        }
    );

    let mut bench = Bench::new(cfg);
    match bench.episode(cause).plan {
        WakePlan::DeepSleep { pin_mask, .. } => {
            assert_ne!(pin_mask & (1 << 26), 0);
            assert_eq!(pin_mask & (1 << 27), 0);
        }
        other => panic!("unexpected plan {other:?}"),
    }
}

#[test]
fn longer_debounce_holds_retrigger() {
    let cfg = load(r#"{"debounce_ms": 10000}"#).unwrap();
    let state = ControllerState {
        last_telemetry_ms: Some(1_000),
        ..Default::default()
    };
    let mut bench = Bench::resume(cfg, state);

    bench.hw.motion = true;
    assert_eq!(bench.published_by(WakeCause::Poll).len(), 1);
    bench.hw.motion = false;
    bench.clock.advance(1_000);
    bench.episode(WakeCause::Poll);

    // 5 s after the trigger: past the default window, inside the stored one.
    bench.hw.motion = true;
    bench.clock.advance(4_000);
    assert!(bench.published_by(WakeCause::Poll).is_empty());
}

#[test]
fn timer_wake_can_be_disabled() {
    let cfg = load(r#"{"timer_wake_enabled": false}"#).unwrap();
    let mut bench = Bench::new(cfg);

    match bench.episode(WakeCause::ColdBoot).plan {
        WakePlan::DeepSleep { timer, pin_mask } => {
            assert_eq!(timer, None);
            assert_ne!(pin_mask, 0);
        }
        other => panic!("unexpected plan {other:?}"),
    }
}

#[test]
fn invalid_override_is_not_applied() {
    assert!(matches!(
        load(r#"{"pin_motion": 5}"#),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(load("not json"), Err(ConfigError::Corrupted));
}
