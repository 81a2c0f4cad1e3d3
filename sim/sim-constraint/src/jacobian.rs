//! Per-axis Jacobian rows.
//!
//! A row maps a scalar impulse `λ` along one constraint axis to velocity
//! changes on both bodies. The sign convention is fixed crate-wide:
//! `+λ` is applied to body 1 and `-λ` to body 2, and relative velocity is
//! measured as body 2 minus body 1, so that applying `λ` changes the
//! relative velocity by `-K·λ`.

use nalgebra::Vector3;
use sim_types::RigidBody;

/// Linear and angular coefficients of one constraint axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisJacobian {
    /// Linear direction (zero for purely angular rows).
    pub axis: Vector3<f64>,
    /// `axis · m1⁻¹`, the linear velocity change of body 1 per unit impulse.
    pub linear1: Vector3<f64>,
    /// `axis · m2⁻¹`.
    pub linear2: Vector3<f64>,
    /// Angular lever of body 1 (`r1 × axis`, or the axis itself for angular rows).
    pub arm1: Vector3<f64>,
    /// Angular lever of body 2.
    pub arm2: Vector3<f64>,
    /// `I1⁻¹ · arm1`, the angular velocity change of body 1 per unit impulse.
    pub angular1: Vector3<f64>,
    /// `I2⁻¹ · arm2`.
    pub angular2: Vector3<f64>,
}

impl Default for AxisJacobian {
    fn default() -> Self {
        Self {
            axis: Vector3::zeros(),
            linear1: Vector3::zeros(),
            linear2: Vector3::zeros(),
            arm1: Vector3::zeros(),
            arm2: Vector3::zeros(),
            angular1: Vector3::zeros(),
            angular2: Vector3::zeros(),
        }
    }
}

impl AxisJacobian {
    /// Row for a point-to-point translational axis with relative anchors
    /// `r1`, `r2` measured from each body's center of mass.
    #[must_use]
    pub fn translational(
        axis: Vector3<f64>,
        r1: &Vector3<f64>,
        r2: &Vector3<f64>,
        body1: &RigidBody,
        body2: &RigidBody,
    ) -> Self {
        let arm1 = r1.cross(&axis);
        let arm2 = r2.cross(&axis);
        Self {
            axis,
            linear1: axis * body1.inverse_mass,
            linear2: axis * body2.inverse_mass,
            arm1,
            arm2,
            angular1: body1.inverse_inertia * arm1,
            angular2: body2.inverse_inertia * arm2,
        }
    }

    /// Row for a rotation about `axis`.
    #[must_use]
    pub fn rotational(axis: Vector3<f64>, body1: &RigidBody, body2: &RigidBody) -> Self {
        Self {
            arm1: axis,
            arm2: axis,
            angular1: body1.inverse_inertia * axis,
            angular2: body2.inverse_inertia * axis,
            ..Self::default()
        }
    }

    /// Effective mass coupling `K_ij` between this row (`i`) and `other` (`j`).
    #[must_use]
    pub fn coupling(&self, other: &Self) -> f64 {
        self.axis.dot(&other.linear1)
            + self.axis.dot(&other.linear2)
            + self.arm1.dot(&other.angular1)
            + self.arm2.dot(&other.angular2)
    }

    /// Relative velocity of body 2 with respect to body 1 along this row.
    #[must_use]
    pub fn relative_velocity(&self, body1: &RigidBody, body2: &RigidBody) -> f64 {
        self.axis.dot(&(body2.linear_velocity - body1.linear_velocity))
            + self.arm2.dot(&body2.angular_velocity)
            - self.arm1.dot(&body1.angular_velocity)
    }

    /// Apply impulse `lambda` along this row.
    pub fn apply(&self, lambda: f64, body1: &mut RigidBody, body2: &mut RigidBody) {
        body1.linear_velocity += self.linear1 * lambda;
        body1.angular_velocity += self.angular1 * lambda;
        body2.linear_velocity -= self.linear2 * lambda;
        body2.angular_velocity -= self.angular2 * lambda;
    }

    /// Whether every coefficient is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            &self.axis,
            &self.linear1,
            &self.linear2,
            &self.arm1,
            &self.arm2,
            &self.angular1,
            &self.angular2,
        ]
        .iter()
        .all(|v| v.iter().all(|x| x.is_finite()))
    }
}
