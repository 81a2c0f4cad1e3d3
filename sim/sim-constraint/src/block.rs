//! Shared three-axis sequential impulse block.
//!
//! [`Translational3Constraint`](crate::Translational3Constraint) and
//! [`Rotational3Constraint`](crate::Rotational3Constraint) differ only in
//! how they measure the per-axis position and build Jacobian rows; the
//! limit classification, softening, warm start, and coupled solve live
//! here.

use nalgebra::{Matrix3, Vector3};
use sim_types::RigidBody;

use crate::axis::{AxisGuards, AxisRow, AxisState};
use crate::effective_mass::{ActiveAxes, EffectiveMass};
use crate::jacobian::AxisJacobian;
use crate::validate::ConditionReport;
use crate::LimitMotor;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Block3 {
    pub axes: [AxisState; 3],
    pub rows: [AxisRow; 3],
    pub jacobians: [AxisJacobian; 3],
    pub mass: EffectiveMass,
}

impl Block3 {
    /// Classify every axis and return the offsets at which to build the
    /// constraint frame.
    pub fn classify(
        &mut self,
        motors: &[LimitMotor; 3],
        positions: [f64; 3],
        guards: AxisGuards,
        time_step: f64,
    ) -> [f64; 3] {
        let mut surfaces = [0.0; 3];
        for i in 0..3 {
            let (row, surface) =
                AxisRow::classify(&mut self.axes[i], &motors[i], positions[i], guards, time_step);
            self.rows[i] = row;
            surfaces[i] = surface;
        }
        surfaces
    }

    /// Install the step's Jacobians, then soften rows and build `K`.
    pub fn finish(
        &mut self,
        jacobians: [AxisJacobian; 3],
        time_step: f64,
        inv_time_step: f64,
        baumgarte: f64,
    ) {
        self.jacobians = jacobians;
        let coupling = Matrix3::from_fn(|i, j| jacobians[i].coupling(&jacobians[j]));

        let mut cfm = Vector3::zeros();
        for i in 0..3 {
            let row = &mut self.rows[i];
            row.soften(
                self.axes[i].state,
                coupling[(i, i)],
                time_step,
                inv_time_step,
                baumgarte,
            );
            cfm[i] = row.cfm;
        }
        self.mass = EffectiveMass::new(coupling, &cfm);
    }

    /// Re-apply last step's accumulated impulses.
    pub fn warm_start(&self, body1: &mut RigidBody, body2: &mut RigidBody) {
        for (axis, jacobian) in self.axes.iter().zip(&self.jacobians) {
            jacobian.apply(axis.total_impulse(), body1, body2);
        }
    }

    /// One sequential impulse iteration.
    pub fn solve(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) {
        let mut rv =
            Vector3::from_fn(|i, _| self.jacobians[i].relative_velocity(body1, body2));

        let inverse_diagonal = *self.mass.inverse_diagonal();
        let mut motor = Vector3::zeros();
        for i in 0..3 {
            motor[i] = self.rows[i].drive(&mut self.axes[i], rv[i], inverse_diagonal[i]);
        }
        rv -= self.mass.coupling() * motor;

        for i in 0..3 {
            rv[i] -= self.rows[i].bias + self.axes[i].limit_impulse * self.rows[i].cfm;
        }

        let old = Vector3::from_fn(|i, _| self.axes[i].limit_impulse);
        let mut delta = self.mass.inverse() * rv;

        let k = *self.mass.matrix();
        let mut clamped = [false; 3];
        for i in 0..3 {
            if self.axes[i].state.rejects(old[i] + delta[i]) {
                clamped[i] = true;
                for j in (0..3).filter(|&j| j != i) {
                    rv[j] += old[i] * k[(j, i)];
                }
            }
        }

        let active = ActiveAxes::from_clamped(clamped);
        if active != ActiveAxes::All {
            delta = self.mass.solve(active, &rv);
        }
        for i in 0..3 {
            // The reduced solve can still push a surviving axis past zero.
            if clamped[i] || self.axes[i].state.rejects(old[i] + delta[i]) {
                delta[i] = -old[i];
            }
            self.axes[i].limit_impulse = old[i] + delta[i];
        }

        let total = motor + delta;
        for (i, jacobian) in self.jacobians.iter().enumerate() {
            jacobian.apply(total[i], body1, body2);
        }
    }

    pub fn condition(&self) -> ConditionReport {
        ConditionReport::of(&self.mass, &self.jacobians)
    }
}
