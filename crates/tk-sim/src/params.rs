//! Run parameters and the loop constants shared by every run.

use serde::{Deserialize, Serialize};
use tk_controls::{FlowCommandMap, PIController, SampleConfig};
use tk_core::{ensure_finite, ensure_non_negative, ensure_positive};

use crate::error::SimResult;

/// Sampling period T_p (s).
pub const SAMPLE_PERIOD_S: f64 = 0.1;
/// Integral time constant T_i (s).
pub const INTEGRAL_TIME_S: f64 = 0.5;
/// Control signal range [U_min, U_max].
pub const CONTROL_MIN: f64 = 0.0;
pub const CONTROL_MAX: f64 = 10.0;
/// Commanded flow range [Qd_min, Qd_max] (m³/s).
pub const FLOW_MIN_M3PS: f64 = 0.0;
pub const FLOW_MAX_M3PS: f64 = 0.05;
/// Tank level at t = 0 (m).
pub const INITIAL_HEIGHT_M: f64 = 0.0;

/// Caller-supplied parameters of one run.
///
/// `Default` yields the reset values of the interactive shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Tank cross-sectional area A (m²), > 0
    pub cross_section: f64,
    /// Drain coefficient beta, >= 0
    pub outflow_coefficient: f64,
    /// Simulated time t_sim (s), > 0
    pub duration: f64,
    /// Desired level h_zad (m), any finite value
    pub setpoint: f64,
    /// Proportional gain k_p, > 0
    pub controller_gain: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            cross_section: 1.5,
            outflow_coefficient: 0.035,
            duration: 3600.0,
            setpoint: 1.25,
            controller_gain: 0.02,
        }
    }
}

impl SimulationParameters {
    /// Reject degenerate parameter sets before any step is taken.
    pub fn validate(&self) -> SimResult<()> {
        ensure_positive(self.cross_section, "cross_section must be positive")?;
        ensure_non_negative(
            self.outflow_coefficient,
            "outflow_coefficient must be non-negative",
        )?;
        ensure_positive(self.duration, "duration must be positive")?;
        ensure_finite(self.setpoint, "setpoint must be finite")?;
        ensure_positive(self.controller_gain, "controller_gain must be positive")?;
        Ok(())
    }
}

/// Sampling, integral and range constants of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopConstants {
    /// T_p (s)
    pub sample_period: f64,
    /// T_i (s)
    pub integral_time: f64,
    pub control_min: f64,
    pub control_max: f64,
    /// m³/s
    pub flow_min: f64,
    /// m³/s
    pub flow_max: f64,
}

impl Default for LoopConstants {
    fn default() -> Self {
        Self {
            sample_period: SAMPLE_PERIOD_S,
            integral_time: INTEGRAL_TIME_S,
            control_min: CONTROL_MIN,
            control_max: CONTROL_MAX,
            flow_min: FLOW_MIN_M3PS,
            flow_max: FLOW_MAX_M3PS,
        }
    }
}

impl LoopConstants {
    pub fn validate(&self) -> SimResult<()> {
        self.sample_config()?;
        self.flow_map()?;
        // kp only matters for finiteness here; the real gain is checked per run
        self.controller(1.0)?;
        Ok(())
    }

    pub fn sample_config(&self) -> SimResult<SampleConfig> {
        Ok(SampleConfig::new(self.sample_period)?)
    }

    pub fn controller(&self, kp: f64) -> SimResult<PIController> {
        Ok(PIController::new(
            kp,
            self.integral_time,
            self.control_min,
            self.control_max,
        )?)
    }

    pub fn flow_map(&self) -> SimResult<FlowCommandMap> {
        Ok(FlowCommandMap::new(
            self.control_min,
            self.control_max,
            self.flow_min,
            self.flow_max,
        )?)
    }
}
