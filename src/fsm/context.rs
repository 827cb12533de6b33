//! Mutable context threaded through every motion FSM handler.
//!
//! Holds the current sample, the debounce bookkeeping and a single output
//! slot.  Handlers only read the sample and write the bookkeeping; the
//! channel drains the output slot after the machine settles.

/// The shared context passed to every state handler function.
#[derive(Debug, Clone)]
pub struct MotionContext {
    // -- Sample --
    /// Level sampled this episode.
    pub level: bool,
    /// Clock reading for this sample.
    pub now_ms: u64,

    // -- Configuration --
    /// Minimum time between two trigger publishes.
    pub debounce_ms: u32,

    // -- Debounce bookkeeping (retained across episodes) --
    /// Set on trigger, cleared when the signal drops.
    pub impulse_latched: bool,
    /// Time of the last trigger.  `None` until the first one since power-on.
    pub last_trigger_ms: Option<u64>,

    // -- Output --
    emit: Option<bool>,
}

impl MotionContext {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            level: false,
            now_ms: 0,
            debounce_ms,
            impulse_latched: false,
            last_trigger_ms: None,
            emit: None,
        }
    }

    /// Load the sample for the next evaluation.
    pub fn observe(&mut self, level: bool, now_ms: u64) {
        self.level = level;
        self.now_ms = now_ms;
    }

    /// `true` once more than `debounce_ms` has passed since the last trigger.
    pub fn window_elapsed(&self) -> bool {
        match self.last_trigger_ms {
            None => true,
            Some(at) => self.now_ms.saturating_sub(at) > u64::from(self.debounce_ms),
        }
    }

    /// Request a publish of `level` on the motion topic.
    pub fn emit(&mut self, level: bool) {
        self.emit = Some(level);
    }

    /// Drain the output slot.
    pub fn take_emit(&mut self) -> Option<bool> {
        self.emit.take()
    }
}
