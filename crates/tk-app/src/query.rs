//! Query helpers for extracting data from finished runs.

use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

use tk_core::nearly_equal;
use tk_sim::SimulationRun;

use crate::error::{AppError, AppResult};

/// A plottable per-sample quantity of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesVariable {
    Height,
    Control,
    CommandedFlow,
    NaturalOutflow,
    Error,
}

impl SeriesVariable {
    pub const ALL: [SeriesVariable; 5] = [
        SeriesVariable::Height,
        SeriesVariable::Control,
        SeriesVariable::CommandedFlow,
        SeriesVariable::NaturalOutflow,
        SeriesVariable::Error,
    ];

    /// CSV column name, unit included.
    pub fn column(&self) -> &'static str {
        match self {
            SeriesVariable::Height => "height_m",
            SeriesVariable::Control => "control",
            SeriesVariable::CommandedFlow => "commanded_flow_m3ps",
            SeriesVariable::NaturalOutflow => "natural_outflow_m3ps",
            SeriesVariable::Error => "error_m",
        }
    }

    pub fn values<'a>(&self, run: &'a SimulationRun) -> &'a [f64] {
        match self {
            SeriesVariable::Height => &run.height,
            SeriesVariable::Control => &run.control_signal,
            SeriesVariable::CommandedFlow => &run.commanded_flow,
            SeriesVariable::NaturalOutflow => &run.natural_outflow,
            SeriesVariable::Error => &run.error_history,
        }
    }
}

impl FromStr for SeriesVariable {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" | "h" | "level" => Ok(SeriesVariable::Height),
            "control" | "u" => Ok(SeriesVariable::Control),
            "commanded_flow" | "flow" | "qd" => Ok(SeriesVariable::CommandedFlow),
            "natural_outflow" | "outflow" | "q_out" => Ok(SeriesVariable::NaturalOutflow),
            "error" | "e" => Ok(SeriesVariable::Error),
            _ => Err(AppError::InvalidInput(format!(
                "Unknown series variable: {}",
                s
            ))),
        }
    }
}

/// Summary of a run's time range, response and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub entry_count: usize,
    pub control_steps: usize,
    pub setpoint: f64,
    pub final_height: f64,
    /// `setpoint - final_height`
    pub steady_state_error: f64,
    pub peak_height: f64,
    /// Peak height above the setpoint, zero if never exceeded
    pub overshoot: f64,
    /// Share of control samples (seed excluded) pinned at a limit
    pub saturated_fraction: f64,
    pub cumulative_abs_error: f64,
    pub cumulative_abs_control: f64,
}

/// Get run summary.
pub fn get_run_summary(run: &SimulationRun) -> AppResult<RunSummary> {
    if run.is_empty() {
        return Err(AppError::InvalidInput("No samples in run".to_string()));
    }

    let t_min = run.time.first().copied().unwrap_or(0.0);
    let t_max = run.time.last().copied().unwrap_or(0.0);
    let final_height = run.final_height().unwrap_or(0.0);
    let peak_height = run
        .height
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let setpoint = run.parameters.setpoint;

    let constants = &run.constants;
    let controls = run.control_signal.get(1..).unwrap_or(&[]);
    let saturated = controls
        .iter()
        .filter(|&&u| {
            nearly_equal(u, constants.control_min, Default::default())
                || nearly_equal(u, constants.control_max, Default::default())
        })
        .count();
    let saturated_fraction = if controls.is_empty() {
        0.0
    } else {
        saturated as f64 / controls.len() as f64
    };

    Ok(RunSummary {
        time_range: (t_min, t_max),
        entry_count: run.len(),
        control_steps: run.control_steps(),
        setpoint,
        final_height,
        steady_state_error: setpoint - final_height,
        peak_height,
        overshoot: (peak_height - setpoint).max(0.0),
        saturated_fraction,
        cumulative_abs_error: run.cumulative_abs_error,
        cumulative_abs_control: run.cumulative_abs_control,
    })
}

/// Extract a `(time, value)` series by variable name.
pub fn extract_series(run: &SimulationRun, variable: &str) -> AppResult<Vec<(f64, f64)>> {
    let variable: SeriesVariable = variable.parse()?;
    Ok(run
        .time
        .iter()
        .copied()
        .zip(variable.values(run).iter().copied())
        .collect())
}

/// Differences between a run and the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunComparison {
    pub current: RunSummary,
    pub previous: RunSummary,
    pub final_height_delta: f64,
    pub overshoot_delta: f64,
    pub abs_error_delta: f64,
    pub abs_control_delta: f64,
}

/// Compare two runs (current minus previous).
pub fn compare_runs(current: &SimulationRun, previous: &SimulationRun) -> AppResult<RunComparison> {
    let current = get_run_summary(current)?;
    let previous = get_run_summary(previous)?;
    Ok(RunComparison {
        final_height_delta: current.final_height - previous.final_height,
        overshoot_delta: current.overshoot - previous.overshoot,
        abs_error_delta: current.cumulative_abs_error - previous.cumulative_abs_error,
        abs_control_delta: current.cumulative_abs_control - previous.cumulative_abs_control,
        current,
        previous,
    })
}

/// Render the chosen series as CSV with a leading `time_s` column.
pub fn series_csv(run: &SimulationRun, variables: &[SeriesVariable]) -> String {
    let mut csv = String::from("time_s");
    for variable in variables {
        csv.push(',');
        csv.push_str(variable.column());
    }
    csv.push('\n');

    for (i, t) in run.time.iter().enumerate() {
        let _ = write!(csv, "{}", t);
        for variable in variables {
            let value = variable.values(run).get(i).copied().unwrap_or(f64::NAN);
            let _ = write!(csv, ",{}", value);
        }
        csv.push('\n');
    }
    csv
}

/// Render one variable of two runs side by side.
///
/// Rows follow the longer run; the shorter one leaves empty cells.
pub fn overlay_csv(
    current: &SimulationRun,
    previous: &SimulationRun,
    variable: SeriesVariable,
) -> String {
    let mut csv = format!(
        "time_s,current_{},previous_{}\n",
        variable.column(),
        variable.column()
    );

    let (cur, prev) = (variable.values(current), variable.values(previous));
    let longer = if current.len() >= previous.len() {
        &current.time
    } else {
        &previous.time
    };
    for (i, t) in longer.iter().enumerate() {
        let cell = |values: &[f64]| values.get(i).map(|v| v.to_string()).unwrap_or_default();
        let _ = writeln!(csv, "{},{},{}", t, cell(cur), cell(prev));
    }
    csv
}

/// The last `count` `(time, height)` samples of a run.
pub fn height_tail(run: &SimulationRun, count: usize) -> Vec<(f64, f64)> {
    let start = run.len().saturating_sub(count);
    run.time[start..]
        .iter()
        .copied()
        .zip(run.height[start..].iter().copied())
        .collect()
}
