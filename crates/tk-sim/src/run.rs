//! The record produced by one level-loop run.

use serde::{Deserialize, Serialize};

use crate::params::{LoopConstants, SimulationParameters};
use crate::plant::OutflowDomain;

/// Index-aligned trajectories of one run plus its diagnostics.
///
/// Every sequence holds the seed entry, one entry per control step and a
/// closing sample, i.e. `floor(duration / T_p) + 3` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub parameters: SimulationParameters,
    pub constants: LoopConstants,
    /// Drain law policy the run was made with
    #[serde(default)]
    pub outflow_domain: OutflowDomain,
    /// Sample instants (s)
    pub time: Vec<f64>,
    /// Tank level (m)
    pub height: Vec<f64>,
    /// Saturated controller output
    pub control_signal: Vec<f64>,
    /// Commanded inflow (m³/s)
    pub commanded_flow: Vec<f64>,
    /// Drain outflow evaluated at the height of the same index (m³/s)
    pub natural_outflow: Vec<f64>,
    /// Tracking error `setpoint - height`
    pub error_history: Vec<f64>,
    /// Σ|error| over every entry after the seed
    pub cumulative_abs_error: f64,
    /// Σ|control| over every entry after the seed
    pub cumulative_abs_control: f64,
}

impl SimulationRun {
    /// Number of entries in each sequence.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Number of control steps N (seed and closing sample excluded).
    pub fn control_steps(&self) -> usize {
        self.len().saturating_sub(2)
    }

    pub fn final_height(&self) -> Option<f64> {
        self.height.last().copied()
    }

    /// Check that all six sequences share one length.
    pub fn is_aligned(&self) -> bool {
        let n = self.time.len();
        [
            self.height.len(),
            self.control_signal.len(),
            self.commanded_flow.len(),
            self.natural_outflow.len(),
            self.error_history.len(),
        ]
        .iter()
        .all(|&len| len == n)
    }
}
