//! Diagnostic checks on a prepared constraint.
//!
//! The hot path never checks its own numerics. These checks run after
//! `pre_solve`, outside the iteration loop, when
//! [`SolverConfig::validate_constraints`](sim_types::SolverConfig) is set
//! or when a test calls `validate()` directly.

use sim_types::{Result, SimError};

use crate::effective_mass::EffectiveMass;
use crate::jacobian::AxisJacobian;

/// Smallest acceptable `|det K| / (K00·K11·K22)`.
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-9;

/// Numerical health of one constraint block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionReport {
    /// Every Jacobian coefficient is finite.
    pub jacobians_finite: bool,
    /// Every entry of `K` and its inverse is finite.
    pub mass_finite: bool,
    /// `|det K| / (K00·K11·K22)`, 1 for independent axes.
    pub reciprocal_condition: f64,
}

impl ConditionReport {
    /// Inspect a three-axis block.
    #[must_use]
    pub fn of(mass: &EffectiveMass, jacobians: &[AxisJacobian]) -> Self {
        Self {
            jacobians_finite: jacobians.iter().all(AxisJacobian::is_finite),
            mass_finite: mass
                .matrix()
                .iter()
                .chain(mass.inverse().iter())
                .all(|x| x.is_finite()),
            reciprocal_condition: mass.reciprocal_condition(),
        }
    }

    /// Inspect a single-axis row with scalar effective mass `k`.
    #[must_use]
    pub fn scalar(k: f64, jacobian: &AxisJacobian) -> Self {
        Self {
            jacobians_finite: jacobian.is_finite(),
            mass_finite: k.is_finite() && (1.0 / k).is_finite(),
            reciprocal_condition: 1.0,
        }
    }

    /// Turn the report into an error if anything is off.
    ///
    /// Non-finite values take precedence over poor conditioning.
    pub fn check(&self) -> Result<()> {
        if !self.jacobians_finite {
            return Err(SimError::diverged("non-finite Jacobian"));
        }
        if !self.mass_finite {
            return Err(SimError::diverged("non-finite effective mass"));
        }
        if self.reciprocal_condition.is_nan()
            || self.reciprocal_condition < MIN_RECIPROCAL_CONDITION
        {
            return Err(SimError::IllConditioned {
                reciprocal_condition: self.reciprocal_condition,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn test_healthy_block_passes() {
        let mass = EffectiveMass::new(Matrix3::identity() * 2.0, &Vector3::zeros());
        let report = ConditionReport::of(&mass, &[AxisJacobian::default(); 3]);
        assert!(report.check().is_ok());
    }

    #[test]
    fn test_nan_jacobian_is_divergence() {
        let mass = EffectiveMass::new(Matrix3::identity(), &Vector3::zeros());
        let mut bad = AxisJacobian::default();
        bad.linear1.x = f64::NAN;

        let err = ConditionReport::of(&mass, &[bad]).check().unwrap_err();
        assert!(err.is_diverged());
    }

    #[test]
    fn test_singular_mass_is_divergence() {
        let mass = EffectiveMass::new(Matrix3::zeros(), &Vector3::zeros());
        let err = ConditionReport::of(&mass, &[]).check().unwrap_err();
        assert!(err.is_diverged());

        let report = ConditionReport::scalar(0.0, &AxisJacobian::default());
        assert!(report.check().unwrap_err().is_diverged());
    }

    #[test]
    fn test_dependent_axes_are_ill_conditioned() {
        let k = Matrix3::new(1.0, 0.999_999_999_9, 0.0, 0.999_999_999_9, 1.0, 0.0, 0.0, 0.0, 1.0);
        let mass = EffectiveMass::new(k, &Vector3::zeros());
        let err = ConditionReport::of(&mass, &[]).check().unwrap_err();
        assert!(matches!(err, SimError::IllConditioned { .. }));
    }
}
