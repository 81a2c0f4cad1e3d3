//! Simulation settings.
//!
//! [`SimulationConfig`] fixes the step size and gravity, [`SolverConfig`]
//! the iteration count of the joint solver, and [`ConstraintTuning`] the
//! numerical guards each joint applies while it prepares a step.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Standard gravity in m/s², pointing down the Z axis.
const STANDARD_GRAVITY: f64 = 9.806_65;

/// Longest step accepted by [`SimulationConfig::validate`], in seconds.
const MAX_TIMESTEP: f64 = 1.0;

/// Step size, gravity and solver settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Seconds advanced by each step.
    pub timestep: f64,
    /// Acceleration added to every dynamic body, m/s².
    pub gravity: Vector3<f64>,
    /// Joint solver settings.
    pub solver: SolverConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::with_timestep(1.0 / 60.0)
    }
}

impl SimulationConfig {
    /// Earth gravity and default solver settings at the given step size.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            gravity: Vector3::new(0.0, 0.0, -STANDARD_GRAVITY),
            solver: SolverConfig::default(),
        }
    }

    /// 60 Hz with eight iterations; same as [`Default`].
    #[must_use]
    pub fn realtime() -> Self {
        Self::default()
    }

    /// 240 Hz with sixteen iterations, for stiff chains and tight limits.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self::with_timestep(1.0 / 240.0).solver(SolverConfig::default().iterations(16))
    }

    /// Replace gravity.
    #[must_use]
    pub fn gravity(self, gravity: Vector3<f64>) -> Self {
        Self { gravity, ..self }
    }

    /// No gravity.
    #[must_use]
    pub fn zero_gravity(self) -> Self {
        self.gravity(Vector3::zeros())
    }

    /// Replace the solver settings.
    #[must_use]
    pub fn solver(self, solver: SolverConfig) -> Self {
        Self { solver, ..self }
    }

    /// Check the step size and gravity, then the solver settings.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidTimestep`] for a non-positive or non-finite step,
    /// [`SimError::InvalidConfig`] for anything else out of range.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(SimError::InvalidTimestep(self.timestep));
        }
        if self.timestep > MAX_TIMESTEP {
            return Err(SimError::invalid_config(format!(
                "timestep {} s exceeds {MAX_TIMESTEP} s",
                self.timestep
            )));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(SimError::invalid_config("gravity has a non-finite component"));
        }
        self.solver.validate()
    }

    /// Steps per second, the `inv_time_step` handed to `pre_solve`.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.timestep.recip()
    }
}

/// Settings for the sequential impulse loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// `solve` sweeps over every joint after the single `pre_solve`.
    pub velocity_iterations: usize,
    /// Run the constraint validation pass after every `pre_solve`.
    ///
    /// On in debug builds only; this is a diagnostic aid and costs a 3x3
    /// determinant per constraint per step.
    pub validate_constraints: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: 8,
            validate_constraints: cfg!(debug_assertions),
        }
    }
}

impl SolverConfig {
    /// Replace the sweep count.
    #[must_use]
    pub fn iterations(self, velocity_iterations: usize) -> Self {
        Self {
            velocity_iterations,
            ..self
        }
    }

    /// Turn the validation pass on or off.
    #[must_use]
    pub fn with_validation(self, validate_constraints: bool) -> Self {
        Self {
            validate_constraints,
            ..self
        }
    }

    /// At least one sweep is required.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] when `velocity_iterations` is zero.
    pub fn validate(&self) -> crate::Result<()> {
        match self.velocity_iterations {
            0 => Err(SimError::invalid_config(
                "velocity_iterations must be at least 1",
            )),
            _ => Ok(()),
        }
    }
}

/// Numerical guards a joint applies while preparing each step.
///
/// Every constraint holds its own copy, so one joint can be tuned without
/// touching the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintTuning {
    /// A translational spring goes slack once its axis offset exceeds this
    /// magnitude, so a far-stretched spring cannot inject a huge impulse.
    pub spring_offset_limit: f64,
    /// Positional error ignored on translational axes, in length units.
    pub linear_slop: f64,
    /// Angular error ignored on rotational axes, in radians.
    pub angular_slop: f64,
    /// Share of the remaining error turned into bias velocity per second
    /// of `inv_time_step` on axes without a spring.
    pub baumgarte: f64,
}

impl Default for ConstraintTuning {
    fn default() -> Self {
        Self {
            spring_offset_limit: 20.0,
            linear_slop: 0.005,
            angular_slop: 0.02,
            baumgarte: 0.05,
        }
    }
}

impl ConstraintTuning {
    /// Drop both dead zones.
    #[must_use]
    pub fn without_slop(self) -> Self {
        Self {
            linear_slop: 0.0,
            angular_slop: 0.0,
            ..self
        }
    }

    /// Replace the Baumgarte factor.
    #[must_use]
    pub fn baumgarte(self, baumgarte: f64) -> Self {
        Self { baumgarte, ..self }
    }

    /// Check every guard is in range.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] naming the first field out of range.
    pub fn validate(&self) -> crate::Result<()> {
        if self.spring_offset_limit.is_nan() || self.spring_offset_limit <= 0.0 {
            return Err(SimError::invalid_config(
                "spring_offset_limit must be positive",
            ));
        }
        if !(self.linear_slop >= 0.0 && self.angular_slop >= 0.0) {
            return Err(SimError::invalid_config("slop must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(SimError::invalid_config("baumgarte must lie in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_run_at_sixty_hertz() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_relative_eq!(config.frequency(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(config.gravity.z, -9.806_65);
        assert_eq!(config, SimulationConfig::realtime());
        assert_eq!(config.solver.velocity_iterations, 8);
    }

    #[test]
    fn test_bad_timesteps_are_rejected() {
        for step in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let err = SimulationConfig::with_timestep(step).validate().unwrap_err();
            assert!(matches!(err, SimError::InvalidTimestep(_)), "{step}");
        }

        let err = SimulationConfig::with_timestep(2.0).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig { .. }));
    }

    #[test]
    fn test_builders_replace_one_field() {
        let config = SimulationConfig::with_timestep(0.01)
            .zero_gravity()
            .solver(SolverConfig::default().iterations(3).with_validation(true));
        assert_relative_eq!(config.timestep, 0.01);
        assert_eq!(config.gravity, Vector3::zeros());
        assert_eq!(config.solver.velocity_iterations, 3);
        assert!(config.solver.validate_constraints);

        let broken = config.gravity(Vector3::new(0.0, f64::NAN, 0.0));
        assert!(broken.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_zero_sweeps_are_rejected() {
        let config = SimulationConfig::default().solver(SolverConfig::default().iterations(0));
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_high_fidelity_preset() {
        let config = SimulationConfig::high_fidelity();
        config.validate().unwrap();
        assert_relative_eq!(config.frequency(), 240.0, epsilon = 1e-9);
        assert_eq!(config.solver.velocity_iterations, 16);
    }

    #[test]
    fn test_tuning_guards() {
        let tuning = ConstraintTuning::default();
        tuning.validate().unwrap();
        assert_relative_eq!(tuning.spring_offset_limit, 20.0);
        assert_relative_eq!(tuning.linear_slop, 0.005);
        assert_relative_eq!(tuning.angular_slop, 0.02);
        assert_relative_eq!(tuning.baumgarte, 0.05);

        let exact = tuning.without_slop();
        assert_relative_eq!(exact.linear_slop, 0.0);
        assert_relative_eq!(exact.angular_slop, 0.0);
        assert_relative_eq!(exact.baumgarte, tuning.baumgarte);

        assert!(tuning.baumgarte(1.5).validate().is_err());
        let negative = ConstraintTuning {
            angular_slop: -0.1,
            ..tuning
        };
        assert!(negative.validate().is_err());
        let nan_limit = ConstraintTuning {
            spring_offset_limit: f64::NAN,
            ..tuning
        };
        assert!(nan_limit.validate().is_err());
    }
}
