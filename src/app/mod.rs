//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the episode rules for the mailbox sensor: wake
//! handling, channel change detection, telemetry cadence and the bounded
//! publish policy.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod publisher;
pub mod sampler;
pub mod service;
pub mod state;
