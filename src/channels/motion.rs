//! Passive-infrared motion channel.
//!
//! The PIR output chatters near its detection threshold.  The latch +
//! debounce window pair guarantees at most one `"1"` per window while still
//! publishing a clean `"0"` as soon as the area clears.  The state machine
//! itself lives in [`crate::fsm`]; this module keeps its retained state.
//!
//! What goes on the wire follows the latch, compared against the last
//! level that reached the broker, as the switch channels do.  A trigger
//! that could not be delivered is retried while the latch holds, and
//! dropped together with its reset once the area clears, so subscribers
//! never see a `"0"` without the `"1"` before it.

use serde::{Deserialize, Serialize};

use crate::fsm::context::MotionContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionState {
    pub state: StateId,
    /// Level sampled by the latest episode.
    pub current_level: bool,
    pub impulse_latched: bool,
    pub last_trigger_ms: Option<u64>,
    /// Level carried by the latest successful publish.
    pub last_published: bool,
}

impl MotionState {
    /// Feed one sample through the state machine.
    /// Returns the level to publish, if any.
    pub fn observe(&mut self, level: bool, now_ms: u64, debounce_ms: u32) -> Option<bool> {
        self.current_level = level;

        let mut ctx = MotionContext::new(debounce_ms);
        ctx.impulse_latched = self.impulse_latched;
        ctx.last_trigger_ms = self.last_trigger_ms;
        ctx.observe(level, now_ms);

        let mut fsm = Fsm::resume(build_state_table(), self.state);
        fsm.settle(&mut ctx);

        self.state = fsm.current_state();
        self.impulse_latched = ctx.impulse_latched;
        self.last_trigger_ms = ctx.last_trigger_ms;
        ctx.take_emit()
    }

    /// Level owed to the broker: the latch, if it differs from what was
    /// last delivered.
    pub fn pending(&self) -> Option<bool> {
        (self.impulse_latched != self.last_published).then_some(self.impulse_latched)
    }

    /// Mark `level` as delivered.
    pub fn commit(&mut self, level: bool) {
        self.last_published = level;
    }
}
