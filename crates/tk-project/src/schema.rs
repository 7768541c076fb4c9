//! Scenario schema definitions.

use serde::{Deserialize, Serialize};

/// Newest scenario format version this crate reads and writes.
pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub version: u32,
    pub name: String,
    pub parameters: ParametersDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<ConstantsDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outflow_domain: Option<OutflowDomainDef>,
}

/// Per-run tank and controller parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParametersDef {
    pub cross_section_m2: f64,
    pub outflow_coefficient: f64,
    pub duration_s: f64,
    pub setpoint_m: f64,
    pub controller_gain: f64,
}

/// Loop constants. Omitted fields take their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConstantsDef {
    pub sample_period_s: f64,
    pub integral_time_s: f64,
    pub control_min: f64,
    pub control_max: f64,
    pub flow_min: f64,
    pub flow_max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutflowDomainDef {
    #[default]
    Clamp,
    Strict,
}

impl Default for ParametersDef {
    fn default() -> Self {
        Self {
            cross_section_m2: 1.5,
            outflow_coefficient: 0.035,
            duration_s: 3600.0,
            setpoint_m: 1.25,
            controller_gain: 0.02,
        }
    }
}

impl Default for ConstantsDef {
    fn default() -> Self {
        Self {
            sample_period_s: 0.1,
            integral_time_s: 0.5,
            control_min: 0.0,
            control_max: 10.0,
            flow_min: 0.0,
            flow_max: 0.05,
        }
    }
}

impl ScenarioDef {
    pub fn new(name: impl Into<String>, parameters: ParametersDef) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            parameters,
            constants: None,
            outflow_domain: None,
        }
    }

    /// The reset scenario: default parameters, implicit constants.
    pub fn reset_defaults() -> Self {
        Self::new("Default tank", ParametersDef::default())
    }

    /// Constants in effect, explicit or default.
    pub fn effective_constants(&self) -> ConstantsDef {
        self.constants.unwrap_or_default()
    }

    pub fn effective_outflow_domain(&self) -> OutflowDomainDef {
        self.outflow_domain.unwrap_or_default()
    }
}
