//! Mapping from controller output to a physical flow command.
//!
//! The inlet valve is treated as ideal: the commanded inflow is an affine
//! rescaling of the control signal range onto the flow range,
//!
//! ```text
//! Qd = (q_max - q_min) / (u_max - u_min) * (u - u_min) + q_min
//! ```
//!
//! The intercepts are kept general even though the default ranges both start
//! at zero.

use serde::{Deserialize, Serialize};
use tk_core::ensure_finite;

use crate::error::{ControlError, ControlResult};

/// Affine control-signal to flow-command map.
///
/// # Example
///
/// ```
/// use tk_controls::FlowCommandMap;
///
/// let map = FlowCommandMap::new(0.0, 10.0, 0.0, 0.05).unwrap();
/// assert!((map.command(5.0) - 0.025).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowCommandMap {
    /// Lower end of the control signal range
    pub u_min: f64,
    /// Upper end of the control signal range
    pub u_max: f64,
    /// Flow commanded at `u_min` (m³/s)
    pub q_min: f64,
    /// Flow commanded at `u_max` (m³/s)
    pub q_max: f64,
}

impl FlowCommandMap {
    /// Create a new flow command map.
    ///
    /// # Errors
    ///
    /// Returns error if any bound is non-finite, if the control range is
    /// empty, or if `q_min > q_max`.
    pub fn new(u_min: f64, u_max: f64, q_min: f64, q_max: f64) -> ControlResult<Self> {
        ensure_finite(u_min, "u_min must be finite")?;
        ensure_finite(u_max, "u_max must be finite")?;
        ensure_finite(q_min, "q_min must be finite")?;
        ensure_finite(q_max, "q_max must be finite")?;
        if u_min >= u_max {
            return Err(ControlError::InvalidArg {
                what: "u_min must be less than u_max",
            });
        }
        if q_min > q_max {
            return Err(ControlError::InvalidArg {
                what: "q_min must not exceed q_max",
            });
        }
        Ok(Self {
            u_min,
            u_max,
            q_min,
            q_max,
        })
    }

    /// Slope of the map (m³/s per unit control).
    pub fn gain(&self) -> f64 {
        (self.q_max - self.q_min) / (self.u_max - self.u_min)
    }

    /// Commanded flow for control signal `u`.
    pub fn command(&self, u: f64) -> f64 {
        self.gain() * (u - self.u_min) + self.q_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ranges_are_linear() {
        let map = FlowCommandMap::new(0.0, 10.0, 0.0, 0.05).unwrap();
        assert_eq!(map.command(0.0), 0.0);
        assert!((map.command(10.0) - 0.05).abs() < 1e-15);
        assert!((map.gain() - 0.005).abs() < 1e-15);
    }

    #[test]
    fn intercepts_are_respected() {
        let map = FlowCommandMap::new(2.0, 12.0, 0.01, 0.06).unwrap();
        assert!((map.command(2.0) - 0.01).abs() < 1e-15);
        assert!((map.command(12.0) - 0.06).abs() < 1e-15);
        assert!((map.command(7.0) - 0.035).abs() < 1e-15);
    }

    #[test]
    fn equal_flow_bounds_give_constant_command() {
        let flat = FlowCommandMap::new(0.0, 1.0, 0.02, 0.02).unwrap();
        assert_eq!(flat.gain(), 0.0);
        assert_eq!(flat.command(0.7), 0.02);
    }

    #[test]
    fn invalid_ranges() {
        assert!(FlowCommandMap::new(1.0, 1.0, 0.0, 0.05).is_err());
        assert!(FlowCommandMap::new(10.0, 0.0, 0.0, 0.05).is_err());
        assert!(FlowCommandMap::new(0.0, 10.0, 0.05, 0.0).is_err());
        assert!(FlowCommandMap::new(0.0, f64::INFINITY, 0.0, 0.05).is_err());
    }
}
