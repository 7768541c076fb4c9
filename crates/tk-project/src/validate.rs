//! Scenario validation logic.

use crate::schema::{ConstantsDef, LATEST_VERSION, ParametersDef, ScenarioDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &ScenarioDef) -> Result<(), ValidationError> {
    if scenario.version == 0 || scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    validate_parameters(&scenario.parameters)?;
    if let Some(constants) = &scenario.constants {
        validate_constants(constants)?;
    }
    Ok(())
}

pub fn validate_parameters(params: &ParametersDef) -> Result<(), ValidationError> {
    positive("parameters.cross_section_m2", params.cross_section_m2)?;
    non_negative(
        "parameters.outflow_coefficient",
        params.outflow_coefficient,
    )?;
    positive("parameters.duration_s", params.duration_s)?;
    finite("parameters.setpoint_m", params.setpoint_m)?;
    positive("parameters.controller_gain", params.controller_gain)?;
    Ok(())
}

pub fn validate_constants(constants: &ConstantsDef) -> Result<(), ValidationError> {
    positive("constants.sample_period_s", constants.sample_period_s)?;
    positive("constants.integral_time_s", constants.integral_time_s)?;
    finite("constants.control_min", constants.control_min)?;
    finite("constants.control_max", constants.control_max)?;
    finite("constants.flow_min", constants.flow_min)?;
    finite("constants.flow_max", constants.flow_max)?;

    if constants.control_min >= constants.control_max {
        return Err(invalid(
            "constants.control_max",
            constants.control_max,
            "must exceed control_min",
        ));
    }
    if constants.flow_min > constants.flow_max {
        return Err(invalid(
            "constants.flow_max",
            constants.flow_max,
            "must not be below flow_min",
        ));
    }
    Ok(())
}

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be non-negative"))
    }
}
