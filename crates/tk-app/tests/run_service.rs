//! End-to-end tests for the run service.

use tk_app::{
    AppError, RunRequest, RunSession, RunStage, SeriesVariable, execute, execute_with_progress,
    get_run_summary, overlay_csv,
};
use tk_sim::{OutflowDomain, SimulationParameters};

fn request(duration: f64, kp: f64) -> RunRequest {
    RunRequest::new(SimulationParameters {
        duration,
        controller_gain: kp,
        ..Default::default()
    })
}

#[test]
fn execute_default_request() {
    let response = execute(&RunRequest::default()).unwrap();
    assert_eq!(response.timing.control_steps, 36_001);
    assert_eq!(response.run.len(), 36_003);

    let summary = get_run_summary(&response.run).unwrap();
    assert!(summary.steady_state_error.abs() < 0.05);
}

#[test]
fn progress_stages_arrive_in_order() {
    let mut req = request(10.0, 0.02);
    req.options.progress_every = 20;

    let mut stages = Vec::new();
    let mut steps = Vec::new();
    let response = execute_with_progress(
        &req,
        Some(&mut |event| {
            stages.push(event.stage);
            if let Some(step) = &event.step {
                steps.push(step.step);
            }
        }),
    )
    .unwrap();

    assert_eq!(stages.first(), Some(&RunStage::Validating));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert_eq!(steps, vec![20, 40, 60, 80, 100, 101]);
    assert_eq!(response.run.control_steps(), 101);
}

#[test]
fn invalid_request_is_rejected_before_simulating() {
    let mut stages = Vec::new();
    let result = execute_with_progress(
        &request(10.0, 0.0),
        Some(&mut |event| stages.push(event.stage)),
    );

    assert!(matches!(result, Err(AppError::Simulation(_))));
    assert_eq!(stages, vec![RunStage::Validating]);
}

#[test]
fn strict_policy_reports_domain_error() {
    let mut req = RunRequest::new(SimulationParameters {
        cross_section: 0.001,
        outflow_coefficient: 0.5,
        duration: 5.0,
        setpoint: 1.0,
        controller_gain: 0.02,
    });
    req.options.outflow_domain = OutflowDomain::Strict;

    match execute(&req) {
        Err(AppError::Simulation(msg)) => assert!(msg.contains("square root"), "{msg}"),
        other => panic!("expected simulation error, got {other:?}"),
    }
}

#[test]
fn session_overlays_consecutive_runs() {
    let mut session = RunSession::new();
    session.record(execute(&request(60.0, 0.02)).unwrap().run);
    session.record(execute(&request(60.0, 0.2)).unwrap().run);

    let comparison = session.comparison().unwrap().unwrap();
    assert_eq!(comparison.previous.entry_count, comparison.current.entry_count);
    assert_eq!(
        comparison.abs_control_delta,
        comparison.current.cumulative_abs_control - comparison.previous.cumulative_abs_control
    );

    let (current, previous) = (session.current().unwrap(), session.previous().unwrap());
    let csv = overlay_csv(current, previous, SeriesVariable::Height);
    assert_eq!(csv.lines().count(), current.len() + 1);
}
