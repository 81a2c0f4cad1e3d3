//! The joint interface the stepping driver works against.

use sim_types::{BodyId, BodySet, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait for all joint constraints.
///
/// A joint is driven in two phases per substep: [`pre_solve`](Joint::pre_solve)
/// exactly once, then [`solve`](Joint::solve) once per solver iteration.
pub trait Joint {
    /// Get the first body ID.
    fn body1(&self) -> BodyId;

    /// Get the second body ID.
    fn body2(&self) -> BodyId;

    /// Get the joint type.
    fn joint_type(&self) -> JointType;

    /// Build Jacobians and effective mass for this substep and apply the
    /// warm start impulses.
    fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64);

    /// Run one sequential impulse iteration.
    fn solve(&mut self, bodies: &mut BodySet);

    /// Check the state prepared by the last `pre_solve`.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl<J: Joint + ?Sized> Joint for Box<J> {
    fn body1(&self) -> BodyId {
        (**self).body1()
    }

    fn body2(&self) -> BodyId {
        (**self).body2()
    }

    fn joint_type(&self) -> JointType {
        (**self).joint_type()
    }

    fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64) {
        (**self).pre_solve(bodies, time_step, inv_time_step);
    }

    fn solve(&mut self, bodies: &mut BodySet) {
        (**self).solve(bodies);
    }

    fn validate(&self) -> Result<()> {
        (**self).validate()
    }
}

/// Type of joint constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Point-to-point constraint along three axes.
    Translational3,
    /// Angular constraint about three axes.
    Rotational3,
    /// Point-to-point constraint along one axis.
    Translational,
    /// Slider: one free translation, everything else locked.
    Prismatic,
}

impl JointType {
    /// Number of constraint rows this joint type solves.
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Translational3 | Self::Rotational3 => 3,
            Self::Translational => 1,
            Self::Prismatic => 6,
        }
    }
}

/// Debug-only precondition checks on the step arguments.
pub(crate) fn debug_assert_step(time_step: f64, inv_time_step: f64) {
    debug_assert!(time_step > 0.0, "time step must be positive, got {time_step}");
    debug_assert!(
        (time_step * inv_time_step - 1.0).abs() < 1e-6,
        "inverse time step {inv_time_step} does not match time step {time_step}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_type_rows() {
        assert_eq!(JointType::Translational3.rows(), 3);
        assert_eq!(JointType::Translational.rows(), 1);
        assert_eq!(JointType::Prismatic.rows(), 6);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "time step must be positive")]
    fn test_step_precondition() {
        debug_assert_step(0.0, f64::INFINITY);
    }
}
