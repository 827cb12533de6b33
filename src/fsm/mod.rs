//! Function-pointer finite state machine engine for the motion channel.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌───────────┬───────────┬──────────┬─────────────────┐  │
//! │  │ StateId   │ on_enter  │ on_exit  │ on_update       │  │
//! │  ├───────────┼───────────┼──────────┼─────────────────┤  │
//! │  │ Idle      │ -         │ -        │ fn(ctx)->Option │  │
//! │  │ Armed     │ -         │ -        │ fn(ctx)->Option │  │
//! │  │ Triggered │ fn(ctx)   │ -        │ fn(ctx)->Option │  │
//! │  │ Cooldown  │ -         │ fn(ctx)  │ fn(ctx)->Option │  │
//! │  └───────────┴───────────┴──────────┴─────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each sample the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the current
//! pointer.  All functions receive `&mut MotionContext`, which holds the
//! sampled level, the clock, the debounce bookkeeping and the output slot.
//!
//! The engine itself is stateless apart from the current index, so it can
//! be rebuilt from a [`StateId`] restored out of retained memory.

pub mod context;
pub mod states;

use context::MotionContext;
use log::debug;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Motion channel states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum StateId {
    /// No signal, impulse latch clear.
    #[default]
    Idle = 0,
    /// Signal present but the debounce window has not elapsed yet.
    Armed = 1,
    /// Trigger published this sample (transient).
    Triggered = 2,
    /// Latch set, waiting for the signal to drop.
    Cooldown = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out-of-range indices fall back
    /// to `Idle` (the latch-clear state).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::Armed,
            2 => Self::Triggered,
            3 => Self::Cooldown,
            _ => {
                debug_assert!(idx == 0, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Transient states are left within the same evaluation.
    pub fn is_transient(self) -> bool {
        self == Self::Triggered
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut MotionContext);

/// Signature for the per-sample update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut MotionContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Rebuild the engine in `state` without running any entry action.
    pub fn resume(table: [StateDescriptor; StateId::COUNT], state: StateId) -> Self {
        Self {
            table,
            current: state as usize,
        }
    }

    /// Run `on_update` for the current state once.
    /// Returns `true` if a transition happened.
    pub fn tick(&mut self, ctx: &mut MotionContext) -> bool {
        match (self.table[self.current].on_update)(ctx) {
            Some(next_id) => {
                self.transition(next_id, ctx);
                true
            }
            None => false,
        }
    }

    /// Tick until the machine rests in a non-transient state.
    pub fn settle(&mut self, ctx: &mut MotionContext) {
        self.tick(ctx);
        // A transient state resolves on its first update; bound the chain
        // by the table size in case a handler misbehaves.
        for _ in 0..StateId::COUNT {
            if !self.current_state().is_transient() {
                break;
            }
            self.tick(ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut MotionContext) {
        let next_idx = next_id as usize;

        debug!(
            "motion FSM: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
