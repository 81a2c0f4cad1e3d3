//! Arena of rigid bodies addressed by [`BodyId`].

use crate::{BodyId, RigidBody};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Owns every rigid body in a simulation.
///
/// Joints hold [`BodyId`] indices into this arena instead of references, so
/// the arena can be mutably borrowed one body pair at a time.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodySet {
    bodies: Vec<RigidBody>,
}

impl BodySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` bodies.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bodies: Vec::with_capacity(capacity),
        }
    }

    /// Add a body and return its ID.
    pub fn insert(&mut self, body: RigidBody) -> BodyId {
        let id = BodyId::new(self.bodies.len());
        self.bodies.push(body);
        id
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the set holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Look up a body.
    #[must_use]
    pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id.index())
    }

    /// Look up a body mutably.
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id.index())
    }

    /// Fallible lookup for callers that want an error rather than an option.
    pub fn try_get(&self, id: BodyId) -> crate::Result<&RigidBody> {
        self.get(id).ok_or(crate::SimError::InvalidBodyId(id.index()))
    }

    /// Borrow two distinct bodies mutably at once.
    ///
    /// # Panics
    ///
    /// Panics if either ID is out of range or if `a == b`. Both are
    /// programming errors in joint construction.
    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> (&mut RigidBody, &mut RigidBody) {
        let (i, j) = (a.index(), b.index());
        assert_ne!(i, j, "a joint cannot connect {a} to itself");
        if i < j {
            let (lo, hi) = self.bodies.split_at_mut(j);
            (&mut lo[i], &mut hi[0])
        } else {
            let (lo, hi) = self.bodies.split_at_mut(i);
            (&mut hi[0], &mut lo[j])
        }
    }

    /// Iterate over `(id, body)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (BodyId::new(i), body))
    }

    /// Iterate mutably over all bodies.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBody> {
        self.bodies.iter_mut()
    }

    /// Advance every body by `dt`.
    pub fn integrate(&mut self, dt: f64) {
        for body in &mut self.bodies {
            body.integrate(dt);
        }
    }
}
