//! Reed-switch channel (letter flap, parcel door).
//!
//! Two states, LOW and HIGH, no debounce.  An edge is reported when the
//! sampled level differs from the last level that actually reached the
//! broker, so a publish that failed is retried on the next episode.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchState {
    /// Level sampled by the latest episode.
    pub current_level: bool,
    /// Level carried by the latest successful publish.
    pub last_published: bool,
}

impl SwitchState {
    /// Record a sample.  Returns the level to publish, if any.
    pub fn observe(&mut self, level: bool) -> Option<bool> {
        self.current_level = level;
        (level != self.last_published).then_some(level)
    }

    /// Mark `level` as delivered.
    pub fn commit(&mut self, level: bool) {
        self.last_published = level;
    }
}
