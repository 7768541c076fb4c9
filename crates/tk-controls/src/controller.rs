//! PI controller for the level loop.
//!
//! The integral term is the rectangular-rule sum of every error seen in the
//! run, including the current one:
//!
//! ```text
//! u_raw = kp * e + (kp * dt / ti) * Σe
//! u     = clamp(u_raw, out_min, out_max)
//! ```
//!
//! There is no anti-windup beyond the output clamp: the error sum keeps
//! accumulating while the output is saturated.

use serde::{Deserialize, Serialize};
use tk_core::{ensure_finite, ensure_positive};

use crate::error::{ControlError, ControlResult};

/// PI controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time constant (seconds). Larger values reduce integral action.
    pub ti: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl PIController {
    /// Create a new PI controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ti` - Integral time constant (seconds)
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        ensure_finite(kp, "kp must be finite")?;
        ensure_positive(ti, "ti must be positive")?;
        ensure_finite(out_min, "out_min must be finite")?;
        ensure_finite(out_max, "out_max must be finite")?;
        if out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
        })
    }

    /// Unsaturated output for the current error and the running error sum.
    ///
    /// `error_sum` must already include `error`.
    pub fn raw_output(&self, error: f64, error_sum: f64, dt: f64) -> f64 {
        (self.kp * error) + (self.kp * dt / self.ti) * error_sum
    }

    /// Clamp a raw output to the controller limits.
    pub fn saturate(&self, raw: f64) -> f64 {
        raw.clamp(self.out_min, self.out_max)
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (contains the error sum)
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint (desired value)
    /// * `dt` - Sample period (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and saturated output value.
    pub fn update(
        &self,
        state: &PIControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
    ) -> (PIControllerState, f64) {
        // Positive error means PV is below setpoint
        let error = sp - pv;
        let error_sum = state.error_sum + error;

        let output = self.saturate(self.raw_output(error, error_sum, dt));

        let new_state = PIControllerState {
            error_sum,
            last_error: error,
            samples: state.samples + 1,
        };

        (new_state, output)
    }
}

/// PI controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PIControllerState {
    /// Running sum of all errors in the run.
    pub error_sum: f64,
    /// Error used in the most recent update.
    pub last_error: f64,
    /// Number of updates performed (seed excluded).
    pub samples: usize,
}

impl PIControllerState {
    /// State whose history already holds one seed error.
    pub fn seeded(initial_error: f64) -> Self {
        Self {
            error_sum: initial_error,
            last_error: initial_error,
            samples: 0,
        }
    }
}
