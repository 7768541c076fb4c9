//! Sampled execution primitives for the digital controller.
//!
//! The controller runs at a fixed sample period. Between samples the
//! commanded flow is held constant (zero-order hold), and the integral term
//! uses the rectangular rule over the same period.

use serde::{Deserialize, Serialize};
use tk_core::ensure_positive;

use crate::error::{ControlError, ControlResult};

/// Largest number of control steps a single run may take.
pub const MAX_CONTROL_STEPS: usize = 10_000_000;

/// Sample configuration for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not positive and finite.
    pub fn new(dt: f64) -> ControlResult<Self> {
        let dt = ensure_positive(dt, "sample period must be positive")?;
        Ok(Self { dt })
    }

    /// Number of control steps taken for a run of `duration` seconds.
    ///
    /// `floor(duration / dt) + 1`, using truncating float division.
    ///
    /// # Errors
    ///
    /// Returns error if `duration` is negative or not finite, or if the
    /// count exceeds [`MAX_CONTROL_STEPS`].
    pub fn control_steps(&self, duration: f64) -> ControlResult<usize> {
        let periods = (duration / self.dt).floor();
        if !(periods >= 0.0 && periods < MAX_CONTROL_STEPS as f64) {
            return Err(ControlError::InvalidArg {
                what: "duration exceeds the control step limit",
            });
        }
        Ok(periods as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_creation() {
        let config = SampleConfig::new(0.1).unwrap();
        assert_eq!(config.dt, 0.1);
    }

    #[test]
    fn invalid_period_rejected() {
        assert!(SampleConfig::new(0.0).is_err());
        assert!(SampleConfig::new(-0.1).is_err());
        assert!(SampleConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn control_steps_counts() {
        let config = SampleConfig::new(0.1).unwrap();
        assert_eq!(config.control_steps(0.1), Ok(2));
        assert_eq!(config.control_steps(1.0), Ok(11));
        assert_eq!(config.control_steps(3600.0), Ok(36_001));
        // 0.3 / 0.1 lands just below 3.0
        assert_eq!(config.control_steps(0.3), Ok(3));
    }

    #[test]
    fn control_steps_limited() {
        let config = SampleConfig::new(0.1).unwrap();
        assert!(config.control_steps(1e19).is_err());
        assert!(config.control_steps(f64::INFINITY).is_err());
        assert!(config.control_steps(f64::NAN).is_err());
        assert!(config.control_steps(-1.0).is_err());

        let last_ok = (MAX_CONTROL_STEPS - 1) as f64;
        let unit = SampleConfig::new(1.0).unwrap();
        assert_eq!(unit.control_steps(last_ok), Ok(MAX_CONTROL_STEPS));
        assert!(unit.control_steps(MAX_CONTROL_STEPS as f64).is_err());
    }
}
