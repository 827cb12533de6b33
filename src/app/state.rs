//! Controller state carried from one episode to the next.
//!
//! Lives in RTC slow memory between deep-sleep cycles (see
//! [`retained`](crate::retained)).  Lost on power loss, in which case the
//! next boot starts from [`ControllerState::default`].

use serde::{Deserialize, Serialize};

use crate::channels::{MotionState, SwitchState};
use crate::wake::TimerPurpose;

use super::sampler::DigitalInput;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    /// Episodes since power-on.  Wraps; diagnostics only.
    pub boot_count: u32,
    pub letter: SwitchState,
    pub parcel: SwitchState,
    pub motion: MotionState,
    /// Clock reading of the last delivered telemetry report.
    pub last_telemetry_ms: Option<u64>,
    /// Purpose of the timer armed before the last deep sleep.
    pub armed_timer: Option<TimerPurpose>,
}

impl ControllerState {
    /// The switch channel for `input`.  `None` for the motion input.
    pub fn switch_mut(&mut self, input: DigitalInput) -> Option<&mut SwitchState> {
        match input {
            DigitalInput::Letter => Some(&mut self.letter),
            DigitalInput::Parcel => Some(&mut self.parcel),
            DigitalInput::Motion => None,
        }
    }
}
