//! Change detection for the three digital wake inputs.
//!
//! | Channel  | Topic            | Rule                                    |
//! |----------|------------------|-----------------------------------------|
//! | letter   | `mailbox/letter` | publish on every edge vs. last published |
//! | parcel   | `mailbox/parcel` | publish on every edge vs. last published |
//! | motion   | `mailbox/pir`    | debounced latch ([`crate::fsm`]) vs. last published |
//!
//! Channel state is plain data so it can live inside the retained
//! [`ControllerState`](crate::app::state::ControllerState).

pub mod motion;
pub mod switch;

pub use motion::MotionState;
pub use switch::SwitchState;
