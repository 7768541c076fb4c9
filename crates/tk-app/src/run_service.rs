//! Run execution service.

use std::time::Instant;
use tk_sim::{LoopConstants, SimOptions, SimProgress, SimulationParameters, SimulationRun};
use tracing::info;

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage, StepProgress};

/// Request to execute a run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub parameters: SimulationParameters,
    pub constants: LoopConstants,
    pub options: SimOptions,
}

impl RunRequest {
    pub fn new(parameters: SimulationParameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }
}

/// Concise timing and execution summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub validate_time_s: f64,
    pub simulate_time_s: f64,
    pub total_time_s: f64,
    pub control_steps: usize,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run: SimulationRun,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    step: Option<StepProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            step,
        });
    }
}

/// Execute a run.
pub fn execute(request: &RunRequest) -> AppResult<RunResponse> {
    execute_with_progress(request, None)
}

/// Execute a run and stream progress events.
///
/// # Errors
///
/// Returns `AppError::Simulation` when the parameters or constants are
/// invalid, or when the strict outflow policy meets a negative height.
pub fn execute_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::Validating,
        started,
        Some("Validating parameters".to_string()),
        None,
    );

    let validate_start = Instant::now();
    request.parameters.validate()?;
    request.constants.validate()?;
    timing.validate_time_s = validate_start.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Simulating,
        started,
        Some("Running level loop".to_string()),
        None,
    );

    let t_end_s = request.parameters.duration;
    let simulate_start = Instant::now();
    let run = {
        let mut on_step = |p: SimProgress| {
            emit_progress(
                &mut progress_cb,
                RunStage::Simulating,
                started,
                None,
                Some(StepProgress {
                    sim_time_s: p.time,
                    t_end_s,
                    fraction_complete: p.fraction_complete(),
                    step: p.step,
                    total_steps: p.total_steps,
                }),
            );
        };
        tk_sim::simulate_with_progress(
            &request.parameters,
            &request.constants,
            &request.options,
            &mut on_step,
        )?
    };
    timing.simulate_time_s = simulate_start.elapsed().as_secs_f64();
    timing.control_steps = run.control_steps();
    timing.total_time_s = started.elapsed().as_secs_f64();

    info!(
        steps = timing.control_steps,
        final_height = run.final_height().unwrap_or_default(),
        total_time_s = timing.total_time_s,
        "run completed"
    );

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse { run, timing })
}
