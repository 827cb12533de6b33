//! Wake-cause classification and wake re-arm planning.
//!
//! ```text
//!   boot ──▶ RawWakeSource ──classify──▶ WakeCause ──▶ episode
//!                                                        │
//!   deep sleep ◀── PowerPort::enter_low_power ◀── plan_wake
//! ```
//!
//! ext1 `ANY_HIGH` fires on a level, not an edge.  Arming it on an input
//! that is already high would wake the chip immediately, forever.  Inputs
//! that are high at sleep time are therefore left out of the pin mask and
//! watched through a short recheck timer instead, which is also how their
//! falling edge gets observed.

use serde::{Deserialize, Serialize};

use crate::app::sampler::{DigitalInput, SensorSnapshot};
use crate::app::state::ControllerState;
use crate::config::{PinMap, RunMode, SystemConfig};

/// Shortest timer wake ever armed.
pub const MIN_TIMER_WAKE_MS: u64 = 1000;

/// Reason for this boot as reported by the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawWakeSource {
    /// Power-on, reset button, brown-out or any non-sleep reset.
    Undefined,
    /// ext1 wake; `mask` holds the GPIO bits that were high.
    Ext1 { mask: u64 },
    /// RTC timer wake.
    Timer,
    /// Any other sleep wake source (touch, ULP, ...), raw IDF value.
    Other(u32),
}

/// What the last sleep timer was armed for.  Stored in retained memory so
/// the next boot can tell a cadence wake from a level recheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerPurpose {
    Telemetry,
    Recheck,
}

/// Classified reason for the current episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeCause {
    /// First boot since power-on, or retained state was lost.
    ColdBoot,
    /// One or more wake inputs went high.
    PinSignal { inputs: heapless::Vec<DigitalInput, 3> },
    /// The telemetry timer elapsed.  Forces a telemetry report.
    Timer,
    /// Level recheck timer, or a continuous-mode loop iteration.
    Poll,
}

impl WakeCause {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ColdBoot => "cold-boot",
            Self::PinSignal { .. } => "pin",
            Self::Timer => "timer",
            Self::Poll => "poll",
        }
    }
}

/// A sleep timer to arm alongside the pin mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerWake {
    pub after_ms: u64,
    pub purpose: TimerPurpose,
}

/// How the episode ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakePlan {
    /// Deep sleep until a masked pin goes high or the timer fires.
    DeepSleep {
        pin_mask: u64,
        timer: Option<TimerWake>,
    },
    /// Stay awake and run the next episode after `poll_ms`.
    Stay { poll_ms: u32 },
}

impl WakePlan {
    /// Purpose of the armed timer, recorded in retained state.
    pub fn timer_purpose(&self) -> Option<TimerPurpose> {
        match self {
            Self::DeepSleep {
                timer: Some(t), ..
            } => Some(t.purpose),
            _ => None,
        }
    }
}

/// Map the raw wake source to a [`WakeCause`].  Total: never fails.
pub fn classify(
    raw: RawWakeSource,
    retained: Option<&ControllerState>,
    pins: &PinMap,
) -> WakeCause {
    let Some(state) = retained else {
        return WakeCause::ColdBoot;
    };

    match raw {
        RawWakeSource::Undefined | RawWakeSource::Other(_) => WakeCause::ColdBoot,
        RawWakeSource::Ext1 { mask } => WakeCause::PinSignal {
            inputs: pins.inputs_in_mask(mask),
        },
        RawWakeSource::Timer => match state.armed_timer {
            Some(TimerPurpose::Recheck) => WakeCause::Poll,
            _ => WakeCause::Timer,
        },
    }
}

/// Decide how to leave the episode.
pub fn plan_wake(
    config: &SystemConfig,
    state: &ControllerState,
    snapshot: &SensorSnapshot,
    now_ms: u64,
) -> WakePlan {
    if config.run_mode == RunMode::Continuous {
        return WakePlan::Stay {
            poll_ms: config.poll_interval_ms,
        };
    }

    let pins = config.pin_map();
    let pin_mask = DigitalInput::ALL
        .into_iter()
        .filter(|input| !snapshot.digital(*input))
        .fold(0u64, |mask, input| mask | (1u64 << pins.gpio(input)));

    let timer = if snapshot.any_input_high() {
        Some(TimerWake {
            after_ms: u64::from(config.level_recheck_ms).max(MIN_TIMER_WAKE_MS),
            purpose: TimerPurpose::Recheck,
        })
    } else if config.timer_wake_enabled {
        Some(TimerWake {
            after_ms: cadence_remaining_ms(config.cadence_ms(), state.last_telemetry_ms, now_ms),
            purpose: TimerPurpose::Telemetry,
        })
    } else {
        None
    };

    WakePlan::DeepSleep { pin_mask, timer }
}

/// Time left until the telemetry cadence elapses.  With no report since
/// power-on a full cadence is waited so an unreachable broker does not
/// turn into a tight wake loop.
fn cadence_remaining_ms(cadence_ms: u64, last: Option<u64>, now_ms: u64) -> u64 {
    let remaining = match last {
        None => cadence_ms,
        Some(at) => cadence_ms.saturating_sub(now_ms.saturating_sub(at)),
    };
    remaining.max(MIN_TIMER_WAKE_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SensorSnapshot {
        SensorSnapshot::default()
    }

    #[test]
    fn no_retained_state_is_cold_boot() {
        let pins = SystemConfig::default().pin_map();
        let cause = classify(RawWakeSource::Ext1 { mask: 1 << 27 }, None, &pins);
        assert_eq!(cause, WakeCause::ColdBoot);
    }

    #[test]
    fn ext1_lists_inputs() {
        let pins = SystemConfig::default().pin_map();
        let state = ControllerState::default();
        let cause = classify(RawWakeSource::Ext1 { mask: 1 << 15 }, Some(&state), &pins);
        match cause {
            WakeCause::PinSignal { inputs } => {
                assert_eq!(inputs.as_slice(), &[DigitalInput::Parcel])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn timer_wake_uses_armed_purpose() {
        let pins = SystemConfig::default().pin_map();
        let mut state = ControllerState::default();
        assert_eq!(classify(RawWakeSource::Timer, Some(&state), &pins), WakeCause::Timer);
        state.armed_timer = Some(TimerPurpose::Recheck);
        assert_eq!(classify(RawWakeSource::Timer, Some(&state), &pins), WakeCause::Poll);
    }

    #[test]
    fn foreign_wake_source_is_cold_boot() {
        let pins = SystemConfig::default().pin_map();
        let state = ControllerState::default();
        assert_eq!(
            classify(RawWakeSource::Other(8), Some(&state), &pins),
            WakeCause::ColdBoot
        );
    }

    #[test]
    fn quiet_inputs_arm_all_pins_and_cadence() {
        let config = SystemConfig::default();
        let mut state = ControllerState::default();
        state.last_telemetry_ms = Some(100_000);
        let plan = plan_wake(&config, &state, &quiet(), 400_000);
        assert_eq!(
            plan,
            WakePlan::DeepSleep {
                pin_mask: (1 << 27) | (1 << 15) | (1 << 4),
                timer: Some(TimerWake {
                    after_ms: 300_000,
                    purpose: TimerPurpose::Telemetry
                }),
            }
        );
    }

    #[test]
    fn held_high_input_is_masked_out_and_rechecked() {
        let config = SystemConfig::default();
        let state = ControllerState::default();
        let snap = SensorSnapshot {
            letter: true,
            ..quiet()
        };
        match plan_wake(&config, &state, &snap, 0) {
            WakePlan::DeepSleep { pin_mask, timer } => {
                assert_eq!(pin_mask & (1 << 27), 0);
                assert_ne!(pin_mask & (1 << 4), 0);
                assert_eq!(timer.map(|t| t.purpose), Some(TimerPurpose::Recheck));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overdue_cadence_clamps_to_minimum() {
        let config = SystemConfig::default();
        let mut state = ControllerState::default();
        state.last_telemetry_ms = Some(0);
        let plan = plan_wake(&config, &state, &quiet(), 10_000_000);
        match plan {
            WakePlan::DeepSleep {
                timer: Some(t), ..
            } => assert_eq!(t.after_ms, MIN_TIMER_WAKE_MS),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn timer_wake_can_be_disabled() {
        let config = SystemConfig {
            timer_wake_enabled: false,
            ..SystemConfig::default()
        };
        let plan = plan_wake(&config, &ControllerState::default(), &quiet(), 0);
        assert_eq!(plan.timer_purpose(), None);
    }

    #[test]
    fn continuous_mode_stays_awake() {
        let config = SystemConfig {
            run_mode: RunMode::Continuous,
            ..SystemConfig::default()
        };
        let plan = plan_wake(&config, &ControllerState::default(), &quiet(), 0);
        assert_eq!(plan, WakePlan::Stay { poll_ms: 200 });
    }
}
