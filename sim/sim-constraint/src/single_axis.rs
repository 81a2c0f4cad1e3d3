//! Single-axis translational constraint.

use sim_types::{BodyId, BodySet, ConstraintTuning, Result, RigidBody};

use crate::axis::{AxisGuards, AxisRow, AxisState};
use crate::jacobian::AxisJacobian;
use crate::joint::debug_assert_step;
use crate::validate::ConditionReport;
use crate::{AnchorWeighting, Joint, JointAnchors, JointType, LimitMotor};

/// Point-to-point constraint along one axis.
///
/// Same limit, motor, spring, and warm start rules as
/// [`Translational3Constraint`](crate::Translational3Constraint), with a
/// scalar effective mass instead of a 3x3 block.
#[derive(Debug, Clone)]
pub struct TranslationalConstraint {
    body1: BodyId,
    body2: BodyId,
    anchors: JointAnchors,
    weighting: AnchorWeighting,
    tuning: ConstraintTuning,
    motor: LimitMotor,
    axis: AxisState,
    row: AxisRow,
    jacobian: AxisJacobian,
    mass: f64,
}

impl TranslationalConstraint {
    /// Create a constraint between two distinct bodies.
    #[must_use]
    pub fn new(body1: BodyId, body2: BodyId, anchors: JointAnchors, motor: LimitMotor) -> Self {
        debug_assert_ne!(body1, body2, "a constraint needs two distinct bodies");
        Self {
            body1,
            body2,
            anchors,
            weighting: AnchorWeighting::default(),
            tuning: ConstraintTuning::default(),
            motor,
            axis: AxisState::default(),
            row: AxisRow::default(),
            jacobian: AxisJacobian::default(),
            mass: 0.0,
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

    /// Get the axis configuration.
    #[must_use]
    pub fn limit_motor(&self) -> &LimitMotor {
        &self.motor
    }

    /// Get the axis configuration for live reconfiguration.
    pub fn limit_motor_mut(&mut self) -> &mut LimitMotor {
        &mut self.motor
    }

    /// Get the persistent axis state.
    #[must_use]
    pub fn axis_state(&self) -> &AxisState {
        &self.axis
    }

    /// Bias velocity from the last `pre_solve`.
    #[must_use]
    pub fn limit_velocity(&self) -> f64 {
        self.row.bias
    }

    /// Constraint force mixing from the last `pre_solve`.
    #[must_use]
    pub fn cfm(&self) -> f64 {
        self.row.cfm
    }

    /// Scalar effective mass before CFM.
    #[must_use]
    pub fn effective_mass(&self) -> f64 {
        self.mass
    }

    /// Relative velocity along the axis.
    pub fn relative_velocity(&self, bodies: &BodySet) -> Result<f64> {
        Ok(self
            .jacobian
            .relative_velocity(bodies.try_get(self.body1)?, bodies.try_get(self.body2)?))
    }

    /// Prepare for a batch of `solve` calls and apply the warm start.
    pub fn pre_solve(&mut self, bodies: &mut BodySet, time_step: f64, inv_time_step: f64) {
        debug_assert_step(time_step, inv_time_step);
        debug_assert!(
            (self.motor.axis.norm() - 1.0).abs() < 1e-6,
            "constraint axis {:?} is not unit length",
            self.motor.axis
        );

        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);
        let world = self.anchors.resolve(body1, body2);
        let position = world.delta().dot(&self.motor.axis);
        let guards = AxisGuards {
            spring_offset_limit: self.tuning.spring_offset_limit,
            slop: self.tuning.linear_slop,
        };
        let (row, surface) =
            AxisRow::classify(&mut self.axis, &self.motor, position, guards, time_step);
        self.row = row;

        let rd = self.motor.axis * surface;
        let w1 = self.weighting.body1_share(body1.inverse_mass, body2.inverse_mass);
        let r1 = world.relative1 + rd * w1;
        let r2 = world.relative2 - rd * (1.0 - w1);

        self.jacobian = AxisJacobian::translational(self.motor.axis, &r1, &r2, body1, body2);
        self.mass = self.jacobian.coupling(&self.jacobian);
        self.row.soften(
            self.axis.state,
            self.mass,
            time_step,
            inv_time_step,
            self.tuning.baumgarte,
        );

        self.jacobian.apply(self.axis.total_impulse(), body1, body2);
    }

    /// Run one sequential impulse iteration.
    pub fn solve(&mut self, bodies: &mut BodySet) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);
        self.solve_pair(body1, body2);
    }

    fn solve_pair(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) {
        let mut rv = self.jacobian.relative_velocity(body1, body2);

        let motor = self.row.drive(&mut self.axis, rv, 1.0 / self.mass);
        rv -= self.mass * motor;
        rv -= self.row.bias + self.axis.limit_impulse * self.row.cfm;

        let old = self.axis.limit_impulse;
        let mut delta = rv / (self.mass + self.row.cfm);
        if self.axis.state.rejects(old + delta) {
            delta = -old;
        }
        self.axis.limit_impulse = old + delta;

        self.jacobian.apply(motor + delta, body1, body2);
    }

    /// Check the prepared Jacobian and effective mass.
    pub fn validate(&self) -> Result<()> {
        ConditionReport::scalar(self.mass + self.row.cfm, &self.jacobian).check()
    }
}

impl Joint for TranslationalConstraint {
    fn body1(&self) -> BodyId {
        self.body1
    }

    fn body2(&self) -> BodyId {
        self.body2
    }

    fn joint_type(&self) -> JointType {
        JointType::Translational
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
