//! Three-axis translational constraint.
//!
//! Couples two bodies along up to three axes through a shared 3x3
//! effective mass block. Each axis has its own hard limit, motor, and
//! spring, configured by a [`LimitMotor`].
//!
//! # Step contract
//!
//! 1. [`pre_solve`](Translational3Constraint::pre_solve) exactly once per
//!    substep: classify limits, build Jacobians and `K`, warm start.
//! 2. [`solve`](Translational3Constraint::solve) once per solver iteration.
//! 3. The caller integrates positions from the updated velocities.
//!
//! Calling `solve` without a `pre_solve` in the same substep reuses stale
//! Jacobians.
//!
//! # Example
//!
//! ```
//! use sim_constraint::{JointAnchors, LimitMotor, Translational3Constraint};
//! use sim_types::{BodySet, MassProperties, Pose, RigidBody};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = BodySet::new();
//! let ground = bodies.insert(RigidBody::fixed(Pose::identity()));
//! let block = bodies.insert(
//!     RigidBody::dynamic(
//!         Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
//!         MassProperties::sphere(1.0, 0.5),
//!     )
//!     .expect("valid mass")
//!     .with_velocity(Vector3::new(0.0, 0.0, -2.0), Vector3::zeros()),
//! );
//!
//! // Lock X and Y, keep Z within [0.5, 2].
//! let mut constraint = Translational3Constraint::new(
//!     ground,
//!     block,
//!     JointAnchors::centers(),
//!     [
//!         LimitMotor::fixed(Vector3::x()),
//!         LimitMotor::fixed(Vector3::y()),
//!         LimitMotor::new(Vector3::z()).with_limits(0.5, 2.0),
//!     ],
//! );
//!
//! let dt = 1.0 / 60.0;
//! constraint.pre_solve(&mut bodies, dt, 1.0 / dt);
//! for _ in 0..10 {
//!     constraint.solve(&mut bodies);
//! }
//! ```

use nalgebra::Vector3;
use sim_types::{BodyId, BodySet, ConstraintTuning, Result, RigidBody};

use crate::axis::{AxisGuards, AxisState};
use crate::block::Block3;
use crate::effective_mass::EffectiveMass;
use crate::jacobian::AxisJacobian;
use crate::joint::debug_assert_step;
use crate::{AnchorWeighting, Joint, JointAnchors, JointType, LimitMotor};

/// Point-to-point constraint along three (not necessarily orthogonal) axes.
#[derive(Debug, Clone)]
pub struct Translational3Constraint {
    body1: BodyId,
    body2: BodyId,
    anchors: JointAnchors,
    weighting: AnchorWeighting,
    tuning: ConstraintTuning,
    motors: [LimitMotor; 3],
    block: Block3,
}

impl Translational3Constraint {
    /// Create a constraint between two distinct bodies.
    #[must_use]
    pub fn new(
        body1: BodyId,
        body2: BodyId,
        anchors: JointAnchors,
        motors: [LimitMotor; 3],
    ) -> Self {
        debug_assert_ne!(body1, body2, "a constraint needs two distinct bodies");
        Self {
            body1,
            body2,
            anchors,
            weighting: AnchorWeighting::default(),
            tuning: ConstraintTuning::default(),
            motors,
            block: Block3::default(),
        }
    }

    /// Set how the constraint frame is split between the bodies.
    #[must_use]
    pub fn with_weighting(mut self, weighting: AnchorWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the stability guards.
    #[must_use]
    pub fn with_tuning(mut self, tuning: ConstraintTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Get the anchor points.
    #[must_use]
    pub fn anchors(&self) -> &JointAnchors {
        &self.anchors
    }

    /// Move the anchor points; takes effect on the next `pre_solve`.
    pub fn set_anchors(&mut self, anchors: JointAnchors) {
        self.anchors = anchors;
    }

    /// Get the per-axis configuration.
    #[must_use]
    pub fn limit_motors(&self) -> &[LimitMotor; 3] {
        &self.motors
    }

    /// Get the per-axis configuration for live reconfiguration.
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

    /// Bias velocity of axis `i` from the last `pre_solve`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn limit_velocity(&self, i: usize) -> f64 {
        self.block.rows[i].bias
    }

    /// Constraint force mixing of axis `i` from the last `pre_solve`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn cfm(&self, i: usize) -> f64 {
        self.block.rows[i].cfm
    }

    /// Maximum motor impulse of axis `i` for the current substep.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn max_motor_impulse(&self, i: usize) -> f64 {
        self.block.rows[i].max_motor_impulse
    }

    /// Get the effective mass block from the last `pre_solve`.
    #[must_use]
    pub fn effective_mass(&self) -> &EffectiveMass {
        &self.block.mass
    }

    /// Get the Jacobian row of axis `i` from the last `pre_solve`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn jacobian(&self, i: usize) -> &AxisJacobian {
        &self.block.jacobians[i]
    }

    /// Current anchor offset along each axis.
    pub fn offsets(&self, bodies: &BodySet) -> Result<[f64; 3]> {
        let world = self.anchors.resolve(bodies.try_get(self.body1)?, bodies.try_get(self.body2)?);
        let delta = world.delta();
        Ok(self.motors.map(|m| delta.dot(&m.axis)))
    }

    /// Relative velocity along each axis, measured with the current Jacobians.
    pub fn relative_velocity(&self, bodies: &BodySet) -> Result<Vector3<f64>> {
        let b1 = bodies.try_get(self.body1)?;
        let b2 = bodies.try_get(self.body2)?;
        Ok(Vector3::from_fn(|i, _| {
            self.block.jacobians[i].relative_velocity(b1, b2)
        }))
    }

    /// Prepare for a batch of `solve` calls and apply the warm start.
    ///
    /// # Panics
    ///
    /// Panics if either body ID is out of range. Debug builds also check
    /// the timestep and axis lengths.
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
        for motor in &self.motors {
            debug_assert!(
                (motor.axis.norm() - 1.0).abs() < 1e-6,
                "constraint axis {:?} is not unit length",
                motor.axis
            );
        }

        let world = self.anchors.resolve(body1, body2);
        let delta = world.delta();
        let positions = self.motors.map(|m| delta.dot(&m.axis));
        let guards = AxisGuards {
            spring_offset_limit: self.tuning.spring_offset_limit,
            slop: self.tuning.linear_slop,
        };
        let surfaces = self.block.classify(&self.motors, positions, guards, time_step);

        let rd = self
            .motors
            .iter()
            .zip(surfaces)
            .fold(Vector3::zeros(), |acc, (m, d)| acc + m.axis * d);
        let w1 = self.weighting.body1_share(body1.inverse_mass, body2.inverse_mass);
        let r1 = world.relative1 + rd * w1;
        let r2 = world.relative2 - rd * (1.0 - w1);

        let jacobians = self
            .motors
            .map(|m| AxisJacobian::translational(m.axis, &r1, &r2, &*body1, &*body2));
        self.block.finish(jacobians, time_step, inv_time_step, self.tuning.baumgarte);
        self.block.warm_start(body1, body2);
    }

    pub(crate) fn solve_pair(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) {
        self.block.solve(body1, body2);
    }
}

impl Joint for Translational3Constraint {
    fn body1(&self) -> BodyId {
        self.body1
    }

    fn body2(&self) -> BodyId {
        self.body2
    }

    fn joint_type(&self) -> JointType {
        JointType::Translational3
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
