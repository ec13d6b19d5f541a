//! Violation Alerting
//!
//! Violation records, per-category cooldowns, and delivery to the session sink.

mod emitter;
mod violation;

pub use emitter::{CategoryState, EmitterConfig, ViolationEmitter};
pub use violation::{GazeEstimator, Pathway, Severity, Violation, ViolationKind};
