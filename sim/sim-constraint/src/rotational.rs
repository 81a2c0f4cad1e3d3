//! Three-axis rotational constraint.
//!
//! The angular counterpart of
//! [`Translational3Constraint`](crate::Translational3Constraint). The
//! position of each axis is [`LimitMotor::angle`], which the owning joint
//! writes before every `pre_solve`; this constraint never measures
//! orientation itself.

use nalgebra::Vector3;
use sim_types::{BodyId, BodySet, ConstraintTuning, Result, RigidBody};

use crate::axis::{AxisGuards, AxisState};
use crate::block::Block3;
use crate::effective_mass::EffectiveMass;
use crate::jacobian::AxisJacobian;
use crate::joint::debug_assert_step;
use crate::{Joint, JointType, LimitMotor};

/// Angular constraint about three axes.
#[derive(Debug, Clone)]
pub struct Rotational3Constraint {
    body1: BodyId,
    body2: BodyId,
    tuning: ConstraintTuning,
    motors: [LimitMotor; 3],
    block: Block3,
}

impl Rotational3Constraint {
    /// Create a constraint between two distinct bodies.
    #[must_use]
    pub fn new(body1: BodyId, body2: BodyId, motors: [LimitMotor; 3]) -> Self {
        debug_assert_ne!(body1, body2, "a constraint needs two distinct bodies");
        Self {
            body1,
            body2,
            tuning: ConstraintTuning::default(),
            motors,
            block: Block3::default(),
        }
    }

    /// Set the stability guards.
    #[must_use]
    pub fn with_tuning(mut self, tuning: ConstraintTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Get the per-axis configuration.
    #[must_use]
    pub fn limit_motors(&self) -> &[LimitMotor; 3] {
        &self.motors
    }

    /// Get the per-axis configuration for live reconfiguration, including
    /// the current angles.
    pub fn limit_motors_mut(&mut self) -> &mut [LimitMotor; 3] {
        &mut self.motors
    }

    /// Get the persistent state of axis `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn axis_state(&self, i: usize) -> &AxisState {
        &self.block.axes[i]
    }

    /// Bias velocity of axis `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn limit_velocity(&self, i: usize) -> f64 {
        self.block.rows[i].bias
    }

    /// Constraint force mixing of axis `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn cfm(&self, i: usize) -> f64 {
        self.block.rows[i].cfm
    }

    /// Get the effective mass block.
    #[must_use]
    pub fn effective_mass(&self) -> &EffectiveMass {
        &self.block.mass
    }

    /// Relative angular velocity about each axis.
    pub fn relative_velocity(&self, bodies: &BodySet) -> Result<Vector3<f64>> {
        let b1 = bodies.try_get(self.body1)?;
        let b2 = bodies.try_get(self.body2)?;
        Ok(Vector3::from_fn(|i, _| {
            self.block.jacobians[i].relative_velocity(b1, b2)
        }))
    }

    /// Prepare for a batch of `solve` calls and apply the warm start.
    pub fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);
        self.prepare(body1, body2, time_step, inv_time_step);
    }

    /// Run one sequential impulse iteration.
    pub fn solve(&mut self, bodies: &mut BodySet) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);
        self.block.solve(body1, body2);
    }

    /// Check the prepared Jacobians and effective mass.
    pub fn validate(&self) -> Result<()> {
        self.block.condition().check()
    }

    pub(crate) fn prepare(
        &mut self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        time_step: f64,
        inv_time_step: f64,
    ) {
        debug_assert_step(time_step, inv_time_step);

        let guards = AxisGuards {
            spring_offset_limit: f64::INFINITY,
            slop: self.tuning.angular_slop,
        };
        let angles = self.motors.map(|m| m.angle);
        self.block.classify(&self.motors, angles, guards, time_step);

        let jacobians = self.motors.map(|m| AxisJacobian::rotational(m.axis, &*body1, &*body2));
        self.block.finish(jacobians, time_step, inv_time_step, self.tuning.baumgarte);
        self.block.warm_start(body1, body2);
    }

    pub(crate) fn solve_pair(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) {
        self.block.solve(body1, body2);
    }
}

impl Joint for Rotational3Constraint {
    fn body1(&self) -> BodyId {
        self.body1
    }

    fn body2(&self) -> BodyId {
        self.body2
    }

    fn joint_type(&self) -> JointType {
        JointType::Rotational3
    }

    fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64) {
        Self::pre_solve(self, bodies, time_step, inv_time_step);
    }

    fn solve(&mut self, bodies: &mut BodySet) {
        Self::solve(self, bodies);
    }

    fn validate(&self) -> Result<()> {
        Self::validate(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::LimitState;
    use approx::assert_relative_eq;
    use sim_types::{MassProperties, Pose};

    const DT: f64 = 0.01;

    fn spinning(omega: Vector3<f64>) -> (BodySet, BodyId, BodyId) {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::fixed(Pose::identity()));
        let b = bodies.insert(
            RigidBody::dynamic(Pose::identity(), MassProperties::sphere(1.0, 0.5))
                .unwrap()
                .with_velocity(Vector3::zeros(), omega),
        );
        (bodies, a, b)
    }

    #[test]
    fn test_lock_stops_rotation() {
        let (mut bodies, a, b) = spinning(Vector3::new(1.0, 2.0, -3.0));
        let mut c = Rotational3Constraint::new(
            a,
            b,
            [
                LimitMotor::fixed(Vector3::x()),
                LimitMotor::fixed(Vector3::y()),
                LimitMotor::fixed(Vector3::z()),
            ],
        );
        c.pre_solve(&mut bodies, DT, 1.0 / DT);
        c.solve(&mut bodies);

        assert_relative_eq!(
            bodies.get(b).unwrap().angular_velocity,
            Vector3::zeros(),
            epsilon = 1e-12
        );
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_angle_drives_limit_state() {
        let (mut bodies, a, b) = spinning(Vector3::zeros());
        let mut c = Rotational3Constraint::new(
            a,
            b,
            [
                LimitMotor::new(Vector3::x()).with_limits(-0.5, 0.5),
                LimitMotor::new(Vector3::y()).with_limits(-0.5, 0.5),
                LimitMotor::new(Vector3::z()),
            ],
        );
        c.limit_motors_mut()[0].angle = 0.8;
        c.limit_motors_mut()[1].angle = -0.51;
        c.pre_solve(&mut bodies, DT, 1.0 / DT);

        assert_eq!(c.axis_state(0).state, LimitState::AtUpper);
        // (0.5 - 0.8 + 0.02) * 0.05 / dt
        assert_relative_eq!(c.limit_velocity(0), -0.28 * 5.0, epsilon = 1e-9);
        assert_eq!(c.axis_state(1).state, LimitState::AtLower);
        // Inside the angular dead zone.
        assert_relative_eq!(c.limit_velocity(1), 0.0);
        assert_eq!(c.axis_state(2).state, LimitState::Free);
    }

    #[test]
    fn test_motor_spins_free_axis() {
        let (mut bodies, a, b) = spinning(Vector3::zeros());
        let mut c = Rotational3Constraint::new(
            a,
            b,
            [
                LimitMotor::fixed(Vector3::x()),
                LimitMotor::fixed(Vector3::y()),
                LimitMotor::new(Vector3::z()).with_motor(2.0, 1e6),
            ],
        );
        c.pre_solve(&mut bodies, DT, 1.0 / DT);
        for _ in 0..10 {
            c.solve(&mut bodies);
        }

        let rv = c.relative_velocity(&bodies).unwrap();
        assert_relative_eq!(rv.z, 2.0, epsilon = 1e-9);
        assert_relative_eq!(rv.x, 0.0, epsilon = 1e-12);
    }
}
