//! Prismatic (slider) joint built from the two three-axis blocks.
//!
//! The slide direction is fixed in both bodies. Every `pre_solve`
//! rebuilds an orthonormal frame `[n, t, b]` around the current slide
//! direction; the translational block frees `n` (subject to the slide's
//! limit, motor, and spring) and locks `t` and `b`, while the rotational
//! block locks all three rotations against the rest orientation.
//!
//! `t` is carried in body 1's frame and re-orthogonalized against `n`, so
//! the frame turns smoothly with the bodies. The locked rows keep their
//! accumulated impulses from step to step, and a frame that jumped would
//! warm start them along the wrong directions.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use sim_types::{BodyId, BodySet, ConstraintTuning, Result, RigidBody, SimError};

use crate::joint::debug_assert_step;
use crate::{
    Joint, JointAnchors, JointType, LimitMotor, Rotational3Constraint, Translational3Constraint,
};

/// Slider joint: one translational degree of freedom.
///
/// # Example
///
/// ```
/// use sim_constraint::PrismaticJoint;
/// use sim_types::{BodySet, MassProperties, Pose, RigidBody};
/// use nalgebra::{Point3, Vector3};
///
/// let mut bodies = BodySet::new();
/// let rail = bodies.insert(RigidBody::fixed(Pose::identity()));
/// let cart = bodies.insert(
///     RigidBody::dynamic(Pose::identity(), MassProperties::sphere(1.0, 0.2)).expect("valid mass"),
/// );
///
/// let joint = PrismaticJoint::new(&bodies, rail, cart, Point3::origin(), Vector3::x())
///     .expect("valid joint")
///     .with_limits(-1.0, 1.0)
///     .with_motor(0.5, 50.0);
/// assert!(joint.slide().motor_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct PrismaticJoint {
    body1: BodyId,
    body2: BodyId,
    local_axis1: Vector3<f64>,
    local_axis2: Vector3<f64>,
    local_tangent1: Vector3<f64>,
    rest_rotation: UnitQuaternion<f64>,
    translational: Translational3Constraint,
    rotational: Rotational3Constraint,
}

impl PrismaticJoint {
    /// Create a slider through `world_anchor` along `world_axis`, using the
    /// bodies' current poses as the rest configuration.
    pub fn new(
        bodies: &BodySet,
        body1: BodyId,
        body2: BodyId,
        world_anchor: Point3<f64>,
        world_axis: Vector3<f64>,
    ) -> Result<Self> {
        if body1 == body2 {
            return Err(SimError::invalid_config(format!(
                "prismatic joint cannot connect {body1} to itself"
            )));
        }
        let b1 = bodies.try_get(body1)?;
        let b2 = bodies.try_get(body2)?;

        let axis = world_axis
            .try_normalize(1e-12)
            .ok_or_else(|| SimError::invalid_config("prismatic axis must be non-zero"))?;

        let anchors = JointAnchors::from_world(&world_anchor, b1, b2);
        let (t, b) = orthonormal_complement(&axis);

        Ok(Self {
            body1,
            body2,
            local_axis1: b1.pose.rotation.inverse() * axis,
            local_axis2: b2.pose.rotation.inverse() * axis,
            local_tangent1: b1.pose.rotation.inverse() * t,
            rest_rotation: b1.pose.rotation.inverse() * b2.pose.rotation,
            translational: Translational3Constraint::new(
                body1,
                body2,
                anchors,
                [
                    LimitMotor::new(axis),
                    LimitMotor::fixed(t),
                    LimitMotor::fixed(b),
                ],
            ),
            rotational: Rotational3Constraint::new(
                body1,
                body2,
                [
                    LimitMotor::fixed(axis),
                    LimitMotor::fixed(t),
                    LimitMotor::fixed(b),
                ],
            ),
        })
    }

    /// Set the slide limits.
    #[must_use]
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.slide_mut().set_limits(lower, upper);
        self
    }

    /// Set the slide motor.
    #[must_use]
    pub fn with_motor(mut self, speed: f64, max_force: f64) -> Self {
        self.slide_mut().set_motor(speed, max_force);
        self
    }

    /// Set the slide spring.
    #[must_use]
    pub fn with_spring(mut self, frequency: f64, damping_ratio: f64) -> Self {
        self.slide_mut().set_spring(frequency, damping_ratio);
        self
    }

    /// Set the stability guards of both blocks.
    #[must_use]
    pub fn with_tuning(mut self, tuning: ConstraintTuning) -> Self {
        self.translational = self.translational.with_tuning(tuning);
        self.rotational = self.rotational.with_tuning(tuning);
        self
    }

    /// Get the slide configuration.
    #[must_use]
    pub fn slide(&self) -> &LimitMotor {
        &self.translational.limit_motors()[0]
    }

    /// Get the slide configuration for live reconfiguration.
    ///
    /// The axis direction is rebuilt every `pre_solve`; only the limit,
    /// motor, and spring fields are meaningful here.
    pub fn slide_mut(&mut self) -> &mut LimitMotor {
        &mut self.translational.limit_motors_mut()[0]
    }

    /// Get the translational block.
    #[must_use]
    pub fn translational(&self) -> &Translational3Constraint {
        &self.translational
    }

    /// Get the rotational block.
    #[must_use]
    pub fn rotational(&self) -> &Rotational3Constraint {
        &self.rotational
    }

    /// Current displacement along the slide.
    pub fn displacement(&self, bodies: &BodySet) -> Result<f64> {
        let b1 = bodies.try_get(self.body1)?;
        let b2 = bodies.try_get(self.body2)?;
        let frame = self.frame(b1, b2);
        let delta = self.translational.anchors().resolve(b1, b2).delta();
        Ok(delta.dot(&frame[0]))
    }

    /// Slide frame `[n, t, b]` for the current poses.
    fn frame(&self, body1: &RigidBody, body2: &RigidBody) -> [Vector3<f64>; 3] {
        let axis1 = body1.pose.rotation * self.local_axis1;
        let axis2 = body2.pose.rotation * self.local_axis2;
        let n = (axis1 * body2.inverse_mass + axis2 * body1.inverse_mass).normalize();
        let tangent = body1.pose.rotation * self.local_tangent1;
        let (t, b) = complement_near(&n, &tangent);
        [n, t, b]
    }

    /// Rotation still separating body 2 from its rest orientation, as a
    /// world-frame scaled axis.
    fn rotation_error(&self, body1: &RigidBody, body2: &RigidBody) -> Vector3<f64> {
        let target = body1.pose.rotation * self.rest_rotation;
        (body2.pose.rotation * target.inverse()).scaled_axis()
    }
}

impl Joint for PrismaticJoint {
    fn body1(&self) -> BodyId {
        self.body1
    }

    fn body2(&self) -> BodyId {
        self.body2
    }

    fn joint_type(&self) -> JointType {
        JointType::Prismatic
    }

    fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64) {
        debug_assert_step(time_step, inv_time_step);
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        let frame = self.frame(body1, body2);
        let error = self.rotation_error(body1, body2);

        for (motor, axis) in self.rotational.limit_motors_mut().iter_mut().zip(frame) {
            motor.axis = axis;
            motor.angle = error.dot(&axis);
        }
        for (motor, axis) in self.translational.limit_motors_mut().iter_mut().zip(frame) {
            motor.axis = axis;
        }

        self.rotational.prepare(body1, body2, time_step, inv_time_step);
        self.translational.prepare(body1, body2, time_step, inv_time_step);
    }

    fn solve(&mut self, bodies: &mut BodySet) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);
        self.rotational.solve_pair(body1, body2);
        self.translational.solve_pair(body1, body2);
    }

    fn validate(&self) -> Result<()> {
        self.rotational.validate()?;
        self.translational.validate()
    }
}

/// Two unit vectors completing `n` to a right-handed orthonormal frame.
fn orthonormal_complement(n: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let t = n.cross(&helper).normalize();
    (t, n.cross(&t))
}

/// Like [`orthonormal_complement`], with `t` as close to `hint` as the
/// plane normal to `n` allows.
fn complement_near(n: &Vector3<f64>, hint: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    match (hint - n * n.dot(hint)).try_normalize(1e-9) {
        Some(t) => (t, n.cross(&t)),
        None => orthonormal_complement(n),
    }
}
