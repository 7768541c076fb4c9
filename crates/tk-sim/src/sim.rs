//! Simulation runner.
//!
//! One run is `NotStarted -> Stepping(1..=N) -> Completed`, executed
//! synchronously. Per control step `i`:
//!
//! 1. `error[i] = setpoint - height[i-1]`
//! 2. `control[i]` from the PI law over `error[0..=i]`, saturated
//! 3. `flow[i]` from the affine flow map
//! 4. `height[i]` advances with the previous command `flow[i-1]` and the
//!    outflow at `height[i-1]`
//!
//! Completion appends a closing sample that applies `flow[N]` once, with
//! control and flow held.

use tk_controls::{FlowCommandMap, PIController, PIControllerState};
use tracing::debug;

use crate::error::SimResult;
use crate::params::{INITIAL_HEIGHT_M, LoopConstants, SimulationParameters};
use crate::plant::{OutflowDomain, TankPlant};
use crate::run::SimulationRun;

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Drain law policy for negative heights
    pub outflow_domain: OutflowDomain,
    /// Report progress every N-th step (0 disables)
    pub progress_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            outflow_domain: OutflowDomain::default(),
            progress_every: 1000,
        }
    }
}

/// Position of a run in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPhase {
    NotStarted,
    /// Last completed control step
    Stepping { step: usize },
    Completed,
}

/// Progress snapshot handed to progress callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub total_steps: usize,
    pub time: f64,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_steps == 0 {
            1.0
        } else {
            self.step as f64 / self.total_steps as f64
        }
    }
}

/// Run with the default loop constants and options.
pub fn simulate(params: &SimulationParameters) -> SimResult<SimulationRun> {
    simulate_with(params, &LoopConstants::default(), &SimOptions::default())
}

/// Run with explicit loop constants and options.
pub fn simulate_with(
    params: &SimulationParameters,
    constants: &LoopConstants,
    opts: &SimOptions,
) -> SimResult<SimulationRun> {
    LevelLoop::new(params, constants, opts)?.run(None)
}

/// Run and stream progress to `progress_cb`.
pub fn simulate_with_progress(
    params: &SimulationParameters,
    constants: &LoopConstants,
    opts: &SimOptions,
    progress_cb: &mut dyn FnMut(SimProgress),
) -> SimResult<SimulationRun> {
    LevelLoop::new(params, constants, opts)?.run(Some(progress_cb))
}

/// The coupled plant/controller loop and its growing record.
#[derive(Debug)]
pub struct LevelLoop {
    params: SimulationParameters,
    plant: TankPlant,
    controller: PIController,
    flow_map: FlowCommandMap,
    controller_state: PIControllerState,
    dt: f64,
    total_steps: usize,
    progress_every: usize,
    phase: SimPhase,
    run: SimulationRun,
}

impl LevelLoop {
    /// Validate inputs and lay down the seed entry.
    pub fn new(
        params: &SimulationParameters,
        constants: &LoopConstants,
        opts: &SimOptions,
    ) -> SimResult<Self> {
        params.validate()?;
        constants.validate()?;

        let sample = constants.sample_config()?;
        let controller = constants.controller(params.controller_gain)?;
        let flow_map = constants.flow_map()?;
        let plant = TankPlant::new(params.cross_section, params.outflow_coefficient)?
            .with_domain(opts.outflow_domain);

        let total_steps = sample.control_steps(params.duration)?;
        let capacity = total_steps + 2;

        let h0 = INITIAL_HEIGHT_M;
        let e0 = params.setpoint - h0;

        let mut run = SimulationRun {
            parameters: *params,
            constants: *constants,
            outflow_domain: opts.outflow_domain,
            time: Vec::with_capacity(capacity),
            height: Vec::with_capacity(capacity),
            control_signal: Vec::with_capacity(capacity),
            commanded_flow: Vec::with_capacity(capacity),
            natural_outflow: Vec::with_capacity(capacity),
            error_history: Vec::with_capacity(capacity),
            cumulative_abs_error: 0.0,
            cumulative_abs_control: 0.0,
        };
        run.time.push(0.0);
        run.height.push(h0);
        run.control_signal.push(params.controller_gain);
        run.commanded_flow.push(0.0);
        run.natural_outflow.push(plant.natural_outflow(h0)?);
        run.error_history.push(e0);

        Ok(Self {
            params: *params,
            plant,
            controller,
            flow_map,
            controller_state: PIControllerState::seeded(e0),
            dt: sample.dt,
            total_steps,
            progress_every: opts.progress_every,
            phase: SimPhase::NotStarted,
            run,
        })
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Number of control steps N this run will take.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Perform one transition and return the new phase.
    pub fn advance(&mut self) -> SimResult<SimPhase> {
        let next = match self.phase {
            SimPhase::NotStarted => 1,
            SimPhase::Stepping { step } => step + 1,
            SimPhase::Completed => return Ok(SimPhase::Completed),
        };

        if next <= self.total_steps {
            self.control_step()?;
            self.phase = SimPhase::Stepping { step: next };
        } else {
            self.closing_sample()?;
            self.phase = SimPhase::Completed;
        }
        Ok(self.phase)
    }

    /// Drive the loop to completion and hand over the record.
    pub fn run(
        mut self,
        mut progress_cb: Option<&mut dyn FnMut(SimProgress)>,
    ) -> SimResult<SimulationRun> {
        debug!(
            cross_section = self.params.cross_section,
            outflow_coefficient = self.params.outflow_coefficient,
            duration = self.params.duration,
            setpoint = self.params.setpoint,
            controller_gain = self.params.controller_gain,
            steps = self.total_steps,
            "starting level-loop run"
        );

        loop {
            let phase = self.advance()?;
            let step = match phase {
                SimPhase::Stepping { step } => step,
                SimPhase::Completed => self.total_steps,
                SimPhase::NotStarted => continue,
            };

            let report = phase == SimPhase::Completed
                || (self.progress_every > 0 && step % self.progress_every == 0);
            if report {
                if let Some(cb) = progress_cb.as_deref_mut() {
                    cb(SimProgress {
                        step,
                        total_steps: self.total_steps,
                        time: self.last(&self.run.time),
                    });
                }
            }

            if phase == SimPhase::Completed {
                break;
            }
        }

        debug!(
            entries = self.run.len(),
            final_height = self.last(&self.run.height),
            cumulative_abs_error = self.run.cumulative_abs_error,
            cumulative_abs_control = self.run.cumulative_abs_control,
            "level-loop run completed"
        );

        Ok(self.run)
    }

    fn last(&self, series: &[f64]) -> f64 {
        // The seed guarantees every series is non-empty
        series.last().copied().unwrap_or(INITIAL_HEIGHT_M)
    }

    fn control_step(&mut self) -> SimResult<()> {
        let h_prev = self.last(&self.run.height);
        let (state, control) = self.controller.update(
            &self.controller_state,
            h_prev,
            self.params.setpoint,
            self.dt,
        );
        let error = state.last_error;
        self.controller_state = state;

        let flow = self.flow_map.command(control);

        // The plant sees last step's command and the outflow at h_prev
        let applied_flow = self.last(&self.run.commanded_flow);
        let outflow_prev = self.last(&self.run.natural_outflow);
        let height = self
            .plant
            .next_height(h_prev, applied_flow, outflow_prev, self.dt);

        self.push(error, control, flow, height)
    }

    fn closing_sample(&mut self) -> SimResult<()> {
        let h_prev = self.last(&self.run.height);
        let control = self.last(&self.run.control_signal);
        let flow = self.last(&self.run.commanded_flow);
        let outflow_prev = self.last(&self.run.natural_outflow);

        let height = self.plant.next_height(h_prev, flow, outflow_prev, self.dt);
        let error = self.params.setpoint - height;

        self.push(error, control, flow, height)
    }

    fn push(&mut self, error: f64, control: f64, flow: f64, height: f64) -> SimResult<()> {
        let outflow = self.plant.natural_outflow(height)?;
        let time = self.last(&self.run.time) + self.dt;

        let run = &mut self.run;
        run.time.push(time);
        run.height.push(height);
        run.control_signal.push(control);
        run.commanded_flow.push(flow);
        run.natural_outflow.push(outflow);
        run.error_history.push(error);
        run.cumulative_abs_error += error.abs();
        run.cumulative_abs_control += control.abs();
        Ok(())
    }
}
