//! End-to-end behavior of the level loop.

use proptest::prelude::*;
use tk_core::numeric::abs_sum;
use tk_sim::params::{CONTROL_MAX, CONTROL_MIN, FLOW_MAX_M3PS, FLOW_MIN_M3PS};
use tk_sim::{
    LoopConstants, OutflowDomain, SimError, SimOptions, SimulationParameters, simulate,
    simulate_with,
};

fn params(duration: f64) -> SimulationParameters {
    SimulationParameters {
        duration,
        ..Default::default()
    }
}

/// Straight transcription of the reference loop: the integral term
/// re-sums the whole error history at every step.
fn reference_heights(p: &SimulationParameters) -> Vec<f64> {
    let (tp, ti) = (0.1, 0.5);
    let (u_min, u_max, q_min, q_max) = (0.0, 10.0, 0.0, 0.05);
    let steps = (p.duration / tp) as usize + 1;

    let mut h = vec![0.0_f64];
    let mut e = vec![p.setpoint - h[0]];
    let mut qd = vec![0.0_f64];

    for j in 0..steps {
        e.push(p.setpoint - h[j]);
        let sum: f64 = e.iter().fold(0.0, |acc, x| acc + x);
        let u = (p.controller_gain * e[j + 1] + (p.controller_gain * tp / ti) * sum)
            .clamp(u_min, u_max);
        qd.push((q_max - q_min) / (u_max - u_min) * (u - u_min) + q_min);
        let last = *h.last().unwrap();
        h.push(last + (qd[j] - p.outflow_coefficient * last.sqrt()) * tp / p.cross_section);
    }
    h
}

#[test]
fn default_run_has_expected_length() {
    let run = simulate(&SimulationParameters::default()).unwrap();
    assert_eq!(run.len(), 36_003);
    assert_eq!(run.control_steps(), 36_001);
    assert!(run.is_aligned());
}

#[test]
fn default_run_time_advances_by_sample_period() {
    let run = simulate(&SimulationParameters::default()).unwrap();
    for (i, w) in run.time.windows(2).enumerate() {
        assert!(((w[1] - w[0]) - 0.1).abs() < 1e-9, "step {i}: {}", w[1] - w[0]);
    }
}

#[test]
fn record_keeps_outflow_policy_through_json() {
    let strict = SimOptions {
        outflow_domain: OutflowDomain::Strict,
        ..Default::default()
    };
    let run = simulate_with(&params(2.0), &LoopConstants::default(), &strict).unwrap();
    let json = serde_json::to_string(&run).unwrap();
    let back: tk_sim::SimulationRun = serde_json::from_str(&json).unwrap();
    assert_eq!(back.outflow_domain, OutflowDomain::Strict);

    let opts = SimOptions {
        outflow_domain: back.outflow_domain,
        ..Default::default()
    };
    let replay = simulate_with(&back.parameters, &back.constants, &opts).unwrap();
    assert_eq!(replay, run);
}

#[test]
fn default_run_settles_near_setpoint() {
    let run = simulate(&SimulationParameters::default()).unwrap();
    let h_end = run.final_height().unwrap();
    assert!((h_end - 1.25).abs() < 0.05, "final height {h_end}");
}

#[test]
fn repeated_runs_are_identical() {
    let p = params(120.0);
    assert_eq!(simulate(&p).unwrap(), simulate(&p).unwrap());
}

#[test]
fn shortest_duration_yields_four_entries() {
    let run = simulate(&params(0.1)).unwrap();
    assert_eq!(run.len(), 4);
    assert_eq!(run.time, vec![0.0, 0.1, 0.2, 0.30000000000000004]);
}

#[test]
fn truncating_step_count() {
    // 0.3 / 0.1 is just below 3
    let run = simulate(&params(0.3)).unwrap();
    assert_eq!(run.control_steps(), 3);
}

#[test]
fn zero_gain_is_rejected() {
    let p = SimulationParameters {
        controller_gain: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        simulate(&p),
        Err(SimError::InvalidParameter { .. })
    ));
}

#[test]
fn invalid_geometry_is_rejected() {
    for p in [
        SimulationParameters {
            cross_section: 0.0,
            ..Default::default()
        },
        SimulationParameters {
            outflow_coefficient: -0.1,
            ..Default::default()
        },
        SimulationParameters {
            duration: 0.0,
            ..Default::default()
        },
        SimulationParameters {
            setpoint: f64::NAN,
            ..Default::default()
        },
    ] {
        assert!(simulate(&p).is_err(), "{p:?} should be rejected");
    }
}

#[test]
fn heights_match_reference_loop() {
    let p = params(120.0);
    let run = simulate(&p).unwrap();
    let reference = reference_heights(&p);

    assert_eq!(reference.len(), run.len() - 1);
    assert_eq!(&run.height[..reference.len()], reference.as_slice());
}

#[test]
fn flow_reaches_plant_one_step_late() {
    let p = params(10.0);
    let run = simulate(&p).unwrap();
    let a = p.cross_section;
    let dt = 0.1;

    for i in 1..run.len() {
        let expected = run.height[i - 1]
            + (run.commanded_flow[i - 1] - run.natural_outflow[i - 1]) * dt / a;
        assert_eq!(run.height[i], expected, "index {i}");
    }
    // The seed command is zero, so the first step only drains an empty tank
    assert_eq!(run.height[1], 0.0);
}

#[test]
fn outflow_pairs_with_height() {
    let p = params(30.0);
    let run = simulate(&p).unwrap();
    for (h, q) in run.height.iter().zip(&run.natural_outflow) {
        assert_eq!(*q, p.outflow_coefficient * h.max(0.0).sqrt());
    }
}

#[test]
fn closing_sample_holds_command() {
    let run = simulate(&params(5.0)).unwrap();
    let n = run.control_steps();
    assert_eq!(run.control_signal[n + 1], run.control_signal[n]);
    assert_eq!(run.commanded_flow[n + 1], run.commanded_flow[n]);
    assert_eq!(
        run.error_history[n + 1],
        run.parameters.setpoint - run.height[n + 1]
    );
}

#[test]
fn diagnostics_match_series() {
    let run = simulate(&params(60.0)).unwrap();
    assert_eq!(run.cumulative_abs_error, abs_sum(&run.error_history[1..]));
    assert_eq!(run.cumulative_abs_control, abs_sum(&run.control_signal[1..]));
}

#[test]
fn strict_domain_fails_on_negative_height() {
    // A tank draining below zero needs inflow the controller cannot reach
    let p = SimulationParameters {
        cross_section: 0.001,
        outflow_coefficient: 0.5,
        setpoint: 1.0,
        controller_gain: 0.02,
        duration: 5.0,
    };
    let constants = LoopConstants::default();

    let clamped = simulate_with(&p, &constants, &SimOptions::default());
    assert!(clamped.is_ok());

    let strict = SimOptions {
        outflow_domain: OutflowDomain::Strict,
        ..Default::default()
    };
    match simulate_with(&p, &constants, &strict) {
        Err(SimError::Domain { height }) => assert!(height < 0.0),
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[test]
fn run_survives_json_round_trip() {
    let run = simulate(&params(2.0)).unwrap();
    let json = serde_json::to_string(&run).unwrap();
    let back: tk_sim::SimulationRun = serde_json::from_str(&json).unwrap();
    assert_eq!(run, back);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn run_invariants_hold(
        area in 0.5f64..5.0,
        beta in 0.0f64..0.1,
        duration in 0.1f64..60.0,
        setpoint in -1.0f64..3.0,
        kp in 0.001f64..5.0,
    ) {
        let p = SimulationParameters {
            cross_section: area,
            outflow_coefficient: beta,
            duration,
            setpoint,
            controller_gain: kp,
        };
        let run = simulate(&p).unwrap();

        prop_assert!(run.is_aligned());
        prop_assert_eq!(run.len(), (duration / 0.1) as usize + 3);
        prop_assert!(run
            .time
            .windows(2)
            .all(|w| ((w[1] - w[0]) - 0.1).abs() < 1e-9));
        prop_assert!(run
            .control_signal
            .iter()
            .all(|u| (CONTROL_MIN..=CONTROL_MAX).contains(u)));
        prop_assert!(run
            .commanded_flow
            .iter()
            .all(|q| (FLOW_MIN_M3PS..=FLOW_MAX_M3PS).contains(q)));
        prop_assert!(run.cumulative_abs_error >= 0.0);
        prop_assert!(run.cumulative_abs_control >= 0.0);
        let n = run.control_steps();
        prop_assert_eq!(run.error_history[0], setpoint - run.height[0]);
        for i in 1..=n {
            prop_assert_eq!(run.error_history[i], setpoint - run.height[i - 1]);
        }
        prop_assert_eq!(run.error_history[n + 1], setpoint - run.height[n + 1]);
    }
}
