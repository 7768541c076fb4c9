//! Scenario loading, saving, validation and conversion to core types.

use std::path::Path;
use tk_project::schema::{ConstantsDef, OutflowDomainDef, ParametersDef, ScenarioDef};
use tk_sim::{LoopConstants, OutflowDomain, SimOptions, SimulationParameters};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::run_service::RunRequest;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a scenario from a YAML or JSON file (chosen by extension).
pub fn load_scenario(path: &Path) -> AppResult<ScenarioDef> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ScenarioFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let scenario = if is_json(path) {
        tk_project::from_json_str(&content)?
    } else {
        tk_project::from_yaml_str(&content)?
    };
    validate_scenario(&scenario)?;

    info!(path = %path.display(), name = %scenario.name, "loaded scenario");
    Ok(scenario)
}

/// Save a scenario as YAML or JSON (chosen by extension).
pub fn save_scenario(path: &Path, scenario: &ScenarioDef) -> AppResult<()> {
    validate_scenario(scenario)?;
    let content = if is_json(path) {
        serde_json::to_string_pretty(scenario)?
    } else {
        tk_project::to_yaml_string(scenario)?
    };

    std::fs::write(path, content).map_err(|e| AppError::ScenarioFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(path = %path.display(), "saved scenario");
    Ok(())
}

/// Validate a scenario's fields and that it builds a runnable loop.
pub fn validate_scenario(scenario: &ScenarioDef) -> AppResult<()> {
    tk_project::validate_scenario(scenario)?;
    let request = request_from_scenario(scenario);
    request.parameters.validate()?;
    request.constants.validate()?;
    Ok(())
}

pub fn parameters_from_def(def: &ParametersDef) -> SimulationParameters {
    SimulationParameters {
        cross_section: def.cross_section_m2,
        outflow_coefficient: def.outflow_coefficient,
        duration: def.duration_s,
        setpoint: def.setpoint_m,
        controller_gain: def.controller_gain,
    }
}

pub fn parameters_to_def(params: &SimulationParameters) -> ParametersDef {
    ParametersDef {
        cross_section_m2: params.cross_section,
        outflow_coefficient: params.outflow_coefficient,
        duration_s: params.duration,
        setpoint_m: params.setpoint,
        controller_gain: params.controller_gain,
    }
}

pub fn constants_from_def(def: &ConstantsDef) -> LoopConstants {
    LoopConstants {
        sample_period: def.sample_period_s,
        integral_time: def.integral_time_s,
        control_min: def.control_min,
        control_max: def.control_max,
        flow_min: def.flow_min,
        flow_max: def.flow_max,
    }
}

pub fn constants_to_def(constants: &LoopConstants) -> ConstantsDef {
    ConstantsDef {
        sample_period_s: constants.sample_period,
        integral_time_s: constants.integral_time,
        control_min: constants.control_min,
        control_max: constants.control_max,
        flow_min: constants.flow_min,
        flow_max: constants.flow_max,
    }
}

pub fn domain_from_def(def: OutflowDomainDef) -> OutflowDomain {
    match def {
        OutflowDomainDef::Clamp => OutflowDomain::ClampToZero,
        OutflowDomainDef::Strict => OutflowDomain::Strict,
    }
}

pub fn domain_to_def(domain: OutflowDomain) -> OutflowDomainDef {
    match domain {
        OutflowDomain::ClampToZero => OutflowDomainDef::Clamp,
        OutflowDomain::Strict => OutflowDomainDef::Strict,
    }
}

/// Build a run request from a scenario, filling omitted sections.
pub fn request_from_scenario(scenario: &ScenarioDef) -> RunRequest {
    RunRequest {
        parameters: parameters_from_def(&scenario.parameters),
        constants: constants_from_def(&scenario.effective_constants()),
        options: SimOptions {
            outflow_domain: domain_from_def(scenario.effective_outflow_domain()),
            ..SimOptions::default()
        },
    }
}

/// Capture a run request as a scenario.
///
/// Default constants and the default outflow policy are left implicit.
pub fn scenario_from_request(name: &str, request: &RunRequest) -> ScenarioDef {
    let mut scenario = ScenarioDef::new(name, parameters_to_def(&request.parameters));
    if request.constants != LoopConstants::default() {
        scenario.constants = Some(constants_to_def(&request.constants));
    }
    if request.options.outflow_domain != OutflowDomain::default() {
        scenario.outflow_domain = Some(domain_to_def(request.options.outflow_domain));
    }
    scenario
}
