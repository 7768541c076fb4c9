//! Current/previous run holder for before-and-after comparison.

use tk_sim::SimulationRun;

use crate::error::AppResult;
use crate::query::{RunComparison, compare_runs};

/// Runs recorded by one interactive session.
///
/// Recording a run moves the current one into `previous`, so frontends can
/// overlay the last two traces.
#[derive(Debug, Clone, Default)]
pub struct RunSession {
    current: Option<SimulationRun>,
    previous: Option<SimulationRun>,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run as the current one.
    pub fn record(&mut self, run: SimulationRun) {
        self.previous = self.current.replace(run);
    }

    /// Forget both runs.
    pub fn reset(&mut self) {
        self.current = None;
        self.previous = None;
    }

    pub fn current(&self) -> Option<&SimulationRun> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&SimulationRun> {
        self.previous.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.current.is_some() && self.previous.is_some()
    }

    /// Compare the current run against the previous one, if both exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if either recorded run is empty.
    pub fn comparison(&self) -> AppResult<Option<RunComparison>> {
        match (&self.current, &self.previous) {
            (Some(current), Some(previous)) => compare_runs(current, previous).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tk_sim::{SimulationParameters, simulate};

    fn run_with_gain(kp: f64) -> SimulationRun {
        simulate(&SimulationParameters {
            controller_gain: kp,
            duration: 5.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn record_shifts_current_into_previous() {
        let mut session = RunSession::new();
        assert!(session.current().is_none());
        assert!(!session.has_overlay());

        session.record(run_with_gain(0.02));
        assert!(session.previous().is_none());
        assert!(session.comparison().unwrap().is_none());

        session.record(run_with_gain(0.5));
        assert!(session.has_overlay());
        assert_eq!(
            session.previous().unwrap().parameters.controller_gain,
            0.02
        );
        assert_eq!(session.current().unwrap().parameters.controller_gain, 0.5);

        session.record(run_with_gain(1.0));
        assert_eq!(session.previous().unwrap().parameters.controller_gain, 0.5);
    }

    #[test]
    fn comparison_reports_empty_run() {
        let mut empty = run_with_gain(0.02);
        empty.time.clear();
        empty.height.clear();

        let mut session = RunSession::new();
        session.record(run_with_gain(0.5));
        session.record(empty);
        assert!(matches!(
            session.comparison(),
            Err(crate::AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn reset_clears_both_runs() {
        let mut session = RunSession::new();
        session.record(run_with_gain(0.02));
        session.record(run_with_gain(0.5));
        session.reset();
        assert!(session.current().is_none());
        assert!(session.previous().is_none());
    }
}
