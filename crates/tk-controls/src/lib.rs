//! Control primitives for the tankflow level loop.
//!
//! The loop is a single scalar feedback path:
//! - a sampled PI controller produces a saturated control signal
//! - a fixed affine map turns that signal into a commanded inflow
//!
//! # Architecture
//!
//! - Controllers are stateless configuration plus an explicit state value,
//!   so a run never hides accumulator state between invocations
//! - Sampling is fixed-period (zero-order hold between samples)
//! - Configuration is validated on construction; evaluation cannot fail

pub mod actuator;
pub mod controller;
pub mod error;
pub mod sampled;

pub use actuator::FlowCommandMap;
pub use controller::{PIController, PIControllerState};
pub use error::{ControlError, ControlResult};
pub use sampled::{MAX_CONTROL_STEPS, SampleConfig};
