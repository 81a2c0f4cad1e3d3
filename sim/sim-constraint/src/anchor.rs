//! Joint anchor points.

use nalgebra::{Point3, Vector3};
use sim_types::RigidBody;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anchor points fixed in each body's local frame.
///
/// World anchors are recomputed from the bodies' current poses on every
/// `pre_solve`, so a joint always follows its bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointAnchors {
    /// Anchor in body 1's frame, relative to its center of mass.
    pub local1: Point3<f64>,
    /// Anchor in body 2's frame, relative to its center of mass.
    pub local2: Point3<f64>,
}

/// World-space anchors for the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAnchors {
    /// Anchor on body 1 in world coordinates.
    pub point1: Point3<f64>,
    /// Anchor on body 2 in world coordinates.
    pub point2: Point3<f64>,
    /// `point1` relative to body 1's center of mass.
    pub relative1: Vector3<f64>,
    /// `point2` relative to body 2's center of mass.
    pub relative2: Vector3<f64>,
}

impl WorldAnchors {
    /// Separation `point2 - point1`.
    #[must_use]
    pub fn delta(&self) -> Vector3<f64> {
        self.point2 - self.point1
    }
}

impl JointAnchors {
    /// Anchors given directly in each body's frame.
    #[must_use]
    pub fn new(local1: Point3<f64>, local2: Point3<f64>) -> Self {
        Self { local1, local2 }
    }

    /// Anchors at the bodies' centers of mass.
    #[must_use]
    pub fn centers() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }

    /// Anchors that coincide at `world` for the bodies' current poses.
    #[must_use]
    pub fn from_world(world: &Point3<f64>, body1: &RigidBody, body2: &RigidBody) -> Self {
        let to_local = |body: &RigidBody| {
            Point3::from(body.pose.rotation.inverse() * (world - body.pose.position))
        };
        Self::new(to_local(body1), to_local(body2))
    }

    /// Resolve the anchors against the bodies' current poses.
    #[must_use]
    pub fn resolve(&self, body1: &RigidBody, body2: &RigidBody) -> WorldAnchors {
        let relative1 = body1.pose.transform_vector(&self.local1.coords);
        let relative2 = body2.pose.transform_vector(&self.local2.coords);
        WorldAnchors {
            point1: body1.pose.position + relative1,
            point2: body2.pose.position + relative2,
            relative1,
            relative2,
        }
    }
}

impl Default for JointAnchors {
    fn default() -> Self {
        Self::centers()
    }
}

/// How the constraint frame is split between the two bodies.
///
/// The Jacobian is evaluated at a point between the two anchors. By
/// default that point divides the anchor separation in proportion to the
/// bodies' inverse masses, so the lighter body carries more of the lever.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnchorWeighting {
    /// Body 1's share is `m2⁻¹ / (m1⁻¹ + m2⁻¹)`.
    #[default]
    MassWeighted,
    /// Body 1's share is given explicitly, in `[0, 1]`.
    Explicit(f64),
}

impl AnchorWeighting {
    /// Body 1's share given both inverse masses.
    ///
    /// Two static bodies produce `NaN` under mass weighting.
    #[must_use]
    pub fn body1_share(self, inverse_mass1: f64, inverse_mass2: f64) -> f64 {
        match self {
            Self::MassWeighted => inverse_mass2 / (inverse_mass1 + inverse_mass2),
            Self::Explicit(weight) => weight,
        }
    }
}
