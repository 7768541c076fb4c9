//! Square-root drain tank.
//!
//! ```text
//! A * dh/dt = Q_in - beta * sqrt(h)
//! ```
//!
//! advanced with one explicit Euler step per sample period. There is no
//! step-size stability check: the period is fixed and small against the
//! tank time constant.

use serde::{Deserialize, Serialize};
use tk_core::{ensure_non_negative, ensure_positive};

use crate::error::{SimError, SimResult};

/// What to do when the outflow law sees a negative height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutflowDomain {
    /// Take the root of the non-negative part (an empty tank does not drain).
    #[default]
    #[serde(rename = "clamp")]
    ClampToZero,
    /// Fail with `SimError::Domain`.
    #[serde(rename = "strict")]
    Strict,
}

/// Tank geometry and drain law.
#[derive(Clone, Debug, PartialEq)]
pub struct TankPlant {
    /// Cross-sectional area (m²)
    pub cross_section: f64,
    /// Drain coefficient beta
    pub outflow_coefficient: f64,
    pub domain: OutflowDomain,
}

impl TankPlant {
    pub fn new(cross_section: f64, outflow_coefficient: f64) -> SimResult<Self> {
        ensure_positive(cross_section, "cross_section must be positive")?;
        ensure_non_negative(
            outflow_coefficient,
            "outflow_coefficient must be non-negative",
        )?;
        Ok(Self {
            cross_section,
            outflow_coefficient,
            domain: OutflowDomain::default(),
        })
    }

    pub fn with_domain(mut self, domain: OutflowDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Natural outflow `beta * sqrt(h)` at the given height.
    pub fn natural_outflow(&self, height: f64) -> SimResult<f64> {
        let h = if height >= 0.0 {
            height
        } else {
            match self.domain {
                OutflowDomain::ClampToZero => 0.0,
                OutflowDomain::Strict => return Err(SimError::Domain { height }),
            }
        };
        Ok(self.outflow_coefficient * h.sqrt())
    }

    /// One explicit Euler step of the level equation.
    pub fn next_height(
        &self,
        height: f64,
        commanded_flow: f64,
        natural_outflow: f64,
        dt: f64,
    ) -> f64 {
        height + (commanded_flow - natural_outflow) * dt / self.cross_section
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outflow_follows_square_root() {
        let plant = TankPlant::new(1.5, 0.035).unwrap();
        assert_eq!(plant.natural_outflow(0.0).unwrap(), 0.0);
        assert!((plant.natural_outflow(4.0).unwrap() - 0.07).abs() < 1e-15);
    }

    #[test]
    fn negative_height_clamped_by_default() {
        let plant = TankPlant::new(1.5, 0.035).unwrap();
        assert_eq!(plant.natural_outflow(-0.2).unwrap(), 0.0);
    }

    #[test]
    fn negative_height_strict_is_domain_error() {
        let plant = TankPlant::new(1.5, 0.035)
            .unwrap()
            .with_domain(OutflowDomain::Strict);
        assert_eq!(
            plant.natural_outflow(-0.2),
            Err(SimError::Domain { height: -0.2 })
        );
        assert!(plant.natural_outflow(0.0).is_ok());
    }

    #[test]
    fn euler_step() {
        let plant = TankPlant::new(2.0, 0.0).unwrap();
        // (0.05 - 0.01) * 0.1 / 2.0 = 0.002
        let h = plant.next_height(1.0, 0.05, 0.01, 0.1);
        assert!((h - 1.002).abs() < 1e-12);
    }

    #[test]
    fn balanced_flow_holds_level() {
        let plant = TankPlant::new(1.5, 0.035).unwrap();
        let out = plant.natural_outflow(1.25).unwrap();
        assert_eq!(plant.next_height(1.25, out, out, 0.1), 1.25);
    }

    #[test]
    fn invalid_geometry() {
        assert!(TankPlant::new(0.0, 0.035).is_err());
        assert!(TankPlant::new(1.5, -0.1).is_err());
    }
}
