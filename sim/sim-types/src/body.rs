//! Bodies as the joint solver sees them.
//!
//! A [`RigidBody`] carries exactly what a constraint touches: the pose it
//! measures anchors from, the two velocities it corrects, and the inverse
//! mass and world-frame inverse inertia that scale every impulse.

use std::fmt;

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Handle of a body in a [`BodySet`](crate::BodySet): its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub usize);

impl BodyId {
    /// Wrap a slot index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Slot index in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for BodyId {
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// World placement of a body's center of mass.
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Center of mass, world frame.
    pub position: Point3<f64>,
    /// Body-to-world rotation.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// At the origin, axes aligned with the world.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_position(Point3::origin())
    }

    /// At `position`, axes aligned with the world.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self::from_position_rotation(position, UnitQuaternion::identity())
    }

    /// At `position`, turned by `rotation`.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Body-frame point to world frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.transform_vector(&local.coords)
    }

    /// Body-frame direction to world frame.
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// No component of position or rotation is `NaN` or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        all_finite(self.position.coords.iter()) && all_finite(self.rotation.coords.iter())
    }
}

/// Mass and body-frame inertia about the center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Mass in kg. Zero or infinite marks an immovable body.
    pub mass: f64,
    /// Inertia tensor in kg·m², body frame.
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Explicit mass and inertia.
    #[must_use]
    pub const fn new(mass: f64, inertia: Matrix3<f64>) -> Self {
        Self { mass, inertia }
    }

    /// Solid ball: `I = 2/5 m r²` about every axis.
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        Self::new(mass, Matrix3::from_diagonal_element(0.4 * mass * radius * radius))
    }

    /// Solid cuboid given by its half extents.
    ///
    /// With full side lengths `a, b, c`, the diagonal is
    /// `m/12 · (b² + c², a² + c², a² + b²)`.
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let sq = (half_extents * 2.0).component_mul(&(half_extents * 2.0));
        let diagonal = Vector3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0);
        Self::new(mass, Matrix3::from_diagonal(&diagonal))
    }

    /// `1 / mass`, or 0 for an immovable body.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.is_static() {
            0.0
        } else {
            self.mass.recip()
        }
    }

    /// Body-frame inverse inertia; `None` when the tensor is singular.
    #[must_use]
    pub fn inverse_inertia(&self) -> Option<Matrix3<f64>> {
        self.inertia.try_inverse()
    }

    /// Zero, negative or infinite mass.
    #[must_use]
    pub fn is_static(&self) -> bool {
        !(self.mass > 0.0 && self.mass.is_finite())
    }

    /// Whether these properties can back a dynamic body: finite positive
    /// mass and a finite positive-definite inertia tensor.
    pub fn validate(&self) -> crate::Result<()> {
        if self.is_static() {
            return Err(SimError::invalid_mass(format!(
                "mass {} is not positive and finite",
                self.mass
            )));
        }
        if !all_finite(self.inertia.iter()) {
            return Err(SimError::invalid_mass("inertia has a non-finite entry"));
        }
        if self.inertia.cholesky().is_none() {
            return Err(SimError::invalid_mass("inertia is not positive definite"));
        }
        Ok(())
    }
}

/// The per-body record constraints read and write.
///
/// `inverse_mass` and `inverse_inertia` are read once per `pre_solve`;
/// the velocities are written in place by every impulse. An immovable
/// body has both inverses at zero, so impulses do nothing to it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Center of mass and orientation.
    pub pose: Pose,
    /// m/s, world frame.
    pub linear_velocity: Vector3<f64>,
    /// rad/s, world frame.
    pub angular_velocity: Vector3<f64>,
    /// 0 for immovable bodies.
    pub inverse_mass: f64,
    /// Body-frame inverse inertia; fixed for the body's lifetime.
    pub local_inverse_inertia: Matrix3<f64>,
    /// World-frame inverse inertia, refreshed whenever the pose rotates.
    pub inverse_inertia: Matrix3<f64>,
}

impl RigidBody {
    /// A body at rest that responds to impulses.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMassProperties`] when `mass` fails
    /// [`MassProperties::validate`].
    pub fn dynamic(pose: Pose, mass: MassProperties) -> crate::Result<Self> {
        mass.validate()?;
        let local_inverse_inertia = mass
            .inverse_inertia()
            .ok_or_else(|| SimError::invalid_mass("inertia is singular"))?;

        let mut body = Self {
            inverse_mass: mass.inverse_mass(),
            local_inverse_inertia,
            ..Self::fixed(pose)
        };
        body.update_world_inertia();
        Ok(body)
    }

    /// A body no impulse can move.
    #[must_use]
    pub fn fixed(pose: Pose) -> Self {
        Self {
            pose,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            inverse_mass: 0.0,
            local_inverse_inertia: Matrix3::zeros(),
            inverse_inertia: Matrix3::zeros(),
        }
    }

    /// Start with the given velocities.
    #[must_use]
    pub fn with_velocity(self, linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self {
            linear_velocity: linear,
            angular_velocity: angular,
            ..self
        }
    }

    /// Whether impulses leave the body untouched.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// Rotate the body-frame inverse inertia into the world: `R I⁻¹ Rᵀ`.
    pub fn update_world_inertia(&mut self) {
        let rotation = self.pose.rotation.to_rotation_matrix();
        let r = rotation.matrix();
        self.inverse_inertia = r * self.local_inverse_inertia * r.transpose();
    }

    /// Semi-implicit Euler: move by the velocities that the joints just
    /// corrected.
    ///
    /// The rotation update is the exact exponential of `ω dt`, renormalized
    /// afterwards. Immovable bodies are left alone.
    pub fn integrate(&mut self, dt: f64) {
        if self.is_static() {
            return;
        }
        self.pose.position += self.linear_velocity * dt;
        let turn = UnitQuaternion::from_scaled_axis(self.angular_velocity * dt);
        let rotation = turn * self.pose.rotation;
        self.pose.rotation = UnitQuaternion::new_normalize(rotation.into_inner());
        self.update_world_inertia();
    }

    /// World velocity of the material point at `offset` from the center:
    /// `v + ω × offset`.
    #[must_use]
    pub fn velocity_at(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.angular_velocity.cross(offset) + self.linear_velocity
    }

    /// Translational plus rotational kinetic energy; 0 when immovable.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_static() {
            return 0.0;
        }
        let translational = self.linear_velocity.norm_squared() / self.inverse_mass;
        let rotational = self.inverse_inertia.try_inverse().map_or(0.0, |inertia| {
            self.angular_velocity.dot(&(inertia * self.angular_velocity))
        });
        0.5 * (translational + rotational)
    }

    /// Pose and both velocities are free of `NaN` and infinities.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite()
            && all_finite(self.linear_velocity.iter())
            && all_finite(self.angular_velocity.iter())
    }
}

fn all_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|v| v.is_finite())
}
