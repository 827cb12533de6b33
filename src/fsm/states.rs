//! Motion channel state handlers.
//!
//! ```text
//!            HIGH, window open            (same sample)
//!   Idle ───────────────────▶ Triggered ───────────────▶ Cooldown
//!    │  ▲                         ▲ publish "1"            │
//!    │  │ LOW                     │ latch, stamp           │ LOW
//!    ▼  │                         │                        │ publish "0"
//!   Armed ────────────────────────┘                        │ clear latch
//!    HIGH, window closed   window opens, still HIGH        ▼
//!                                                        Idle
//! ```

use super::context::MotionContext;
use super::{StateDescriptor, StateId};

pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Idle,
            name: "IDLE",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: StateId::Armed,
            name: "ARMED",
            on_enter: None,
            on_exit: None,
            on_update: armed_update,
        },
        StateDescriptor {
            id: StateId::Triggered,
            name: "TRIGGERED",
            on_enter: Some(triggered_enter),
            on_exit: None,
            on_update: triggered_update,
        },
        StateDescriptor {
            id: StateId::Cooldown,
            name: "COOLDOWN",
            on_enter: None,
            on_exit: Some(cooldown_exit),
            on_update: cooldown_update,
        },
    ]
}

// ── IDLE ──────────────────────────────────────────────────────

fn idle_update(ctx: &mut MotionContext) -> Option<StateId> {
    if !ctx.level {
        return None;
    }
    if !ctx.impulse_latched && ctx.window_elapsed() {
        Some(StateId::Triggered)
    } else {
        Some(StateId::Armed)
    }
}

// ── ARMED ─────────────────────────────────────────────────────

fn armed_update(ctx: &mut MotionContext) -> Option<StateId> {
    if !ctx.level {
        return Some(StateId::Idle);
    }
    if !ctx.impulse_latched && ctx.window_elapsed() {
        return Some(StateId::Triggered);
    }
    None
}

// ── TRIGGERED ─────────────────────────────────────────────────

fn triggered_enter(ctx: &mut MotionContext) {
    ctx.impulse_latched = true;
    ctx.last_trigger_ms = Some(ctx.now_ms);
    ctx.emit(true);
}

fn triggered_update(_ctx: &mut MotionContext) -> Option<StateId> {
    Some(StateId::Cooldown)
}

// ── COOLDOWN ──────────────────────────────────────────────────

fn cooldown_update(ctx: &mut MotionContext) -> Option<StateId> {
    if ctx.level { None } else { Some(StateId::Idle) }
}

fn cooldown_exit(ctx: &mut MotionContext) {
    ctx.impulse_latched = false;
    ctx.emit(false);
}
