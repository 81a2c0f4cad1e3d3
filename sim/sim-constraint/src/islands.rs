//! Constraint islands.
//!
//! An island is a set of moving bodies that share joints, directly or
//! through a chain of other moving bodies, together with those joints.
//! Islands never exchange impulses, so they can be solved one at a time
//! or handed to separate workers.
//!
//! Static bodies are not links in the chain. A wall holding two separate
//! ropes yields two islands: nothing pushed into the wall can come back
//! out on the other rope. A joint between a static and a moving body is
//! owned by the island of the moving body.
//!
//! Grouping runs a disjoint-set forest over the bodies referenced by the
//! joints, with path halving and union by size, so a build is close to
//! linear in the number of joints.
//!
//! ```
//! use sim_constraint::{ConstraintIslands, JointAnchors, LimitMotor, TranslationalConstraint};
//! use sim_types::BodyId;
//! use nalgebra::Vector3;
//!
//! let link = |a, b| {
//!     TranslationalConstraint::new(
//!         BodyId::new(a),
//!         BodyId::new(b),
//!         JointAnchors::centers(),
//!         LimitMotor::fixed(Vector3::z()),
//!     )
//! };
//! // Body 0 is the ground; it holds the chain 1-2 and the single body 3.
//! let joints = vec![link(0, 1), link(1, 2), link(0, 3)];
//!
//! let islands = ConstraintIslands::build(&joints, |id| id.index() == 0);
//! assert_eq!(islands.len(), 2);
//! assert!(islands.connected(BodyId::new(1), BodyId::new(2)));
//! assert!(!islands.connected(BodyId::new(2), BodyId::new(3)));
//! ```

use sim_types::{BodyId, BodySet, RigidBody};
use std::collections::HashMap;

use crate::Joint;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bodies and joints that must be solved together.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Island {
    /// Member bodies in ascending ID order.
    ///
    /// A static body is only a member when a joint ties it to another
    /// static body.
    pub bodies: Vec<BodyId>,

    /// Positions of the member joints in the slice passed to
    /// [`ConstraintIslands::build`], ascending.
    pub joints: Vec<usize>,

    /// No member can move. The stepping driver skips such islands.
    pub is_static: bool,
}

impl Island {
    /// Number of member bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of member joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Whether `body` is a member.
    #[must_use]
    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.binary_search(&body).is_ok()
    }
}

/// Partition of a joint list into independent islands.
///
/// Islands are numbered in the order their first joint appears in the
/// input, which keeps solving order reproducible between runs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintIslands {
    islands: Vec<Island>,
    membership: HashMap<BodyId, usize>,
    joint_count: usize,
}

impl ConstraintIslands {
    /// Group `joints`, asking `is_body_static` once per distinct body.
    #[must_use]
    pub fn build<J, F>(joints: &[J], is_body_static: F) -> Self
    where
        J: Joint,
        F: Fn(BodyId) -> bool,
    {
        // Dense node numbering for the forest, in first-seen order.
        let mut node_of: HashMap<BodyId, usize> = HashMap::new();
        let mut nodes: Vec<(BodyId, bool)> = Vec::new();
        let mut ends: Vec<(usize, usize)> = Vec::with_capacity(joints.len());
        for joint in joints {
            let mut node = |id: BodyId| {
                *node_of.entry(id).or_insert_with(|| {
                    nodes.push((id, is_body_static(id)));
                    nodes.len() - 1
                })
            };
            let first = node(joint.body1());
            let second = node(joint.body2());
            ends.push((first, second));
        }

        let mut forest = DisjointSets::singletons(nodes.len());
        for &(a, b) in &ends {
            if nodes[a].1 == nodes[b].1 {
                forest.merge(a, b);
            }
        }

        let mut island_of_root: HashMap<usize, usize> = HashMap::new();
        let mut islands: Vec<Island> = Vec::new();
        for (index, &(a, b)) in ends.iter().enumerate() {
            let owner = if nodes[a].1 && !nodes[b].1 { b } else { a };
            let root = forest.root(owner);
            let slot = *island_of_root.entry(root).or_insert_with(|| {
                islands.push(Island::default());
                islands.len() - 1
            });
            islands[slot].joints.push(index);
        }

        let mut membership = HashMap::with_capacity(nodes.len());
        for (node, &(id, _)) in nodes.iter().enumerate() {
            let root = forest.root(node);
            if let Some(&slot) = island_of_root.get(&root) {
                islands[slot].bodies.push(id);
                membership.insert(id, slot);
            }
        }

        for island in &mut islands {
            island.bodies.sort_unstable();
            island.is_static = island
                .bodies
                .iter()
                .all(|id| node_of.get(id).map_or(true, |&n| nodes[n].1));
        }

        Self {
            islands,
            membership,
            joint_count: joints.len(),
        }
    }

    /// Group `joints` using the static flags stored in `bodies`.
    ///
    /// A body ID missing from the arena is treated as static.
    #[must_use]
    pub fn from_bodies<J: Joint>(joints: &[J], bodies: &BodySet) -> Self {
        Self::build(joints, |id| bodies.get(id).map_or(true, RigidBody::is_static))
    }

    /// Number of islands, static ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    /// True when there were no joints to group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// All islands in build order.
    #[must_use]
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Island at `index` in build order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Island> {
        self.islands.get(index)
    }

    /// Index of the island that holds `body`, if any.
    #[must_use]
    pub fn island_of(&self, body: BodyId) -> Option<usize> {
        self.membership.get(&body).copied()
    }

    /// Whether both bodies are members of one island.
    #[must_use]
    pub fn connected(&self, a: BodyId, b: BodyId) -> bool {
        matches!(
            (self.island_of(a), self.island_of(b)),
            (Some(x), Some(y)) if x == y
        )
    }

    /// Bodies that ended up in some island.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.membership.len()
    }

    /// Joints that were grouped; every joint lands in exactly one island.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// Islands with at least one moving body.
    pub fn active(&self) -> impl Iterator<Item = (usize, &Island)> {
        self.islands
            .iter()
            .enumerate()
            .filter(|(_, island)| !island.is_static)
    }

    /// Number of islands the stepping driver will solve.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Size distribution of the islands.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn statistics(&self) -> IslandStatistics {
        let mut stats = IslandStatistics {
            islands: self.islands.len(),
            ..IslandStatistics::default()
        };
        if self.islands.is_empty() {
            return stats;
        }

        for island in &self.islands {
            stats.static_islands += usize::from(island.is_static);
            stats.most_bodies = stats.most_bodies.max(island.body_count());
            stats.most_joints = stats.most_joints.max(island.joint_count());
        }
        let count = self.islands.len() as f64;
        stats.mean_bodies = self.body_count() as f64 / count;
        stats.mean_joints = self.joint_count as f64 / count;
        stats
    }
}

/// Summary returned by [`ConstraintIslands::statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IslandStatistics {
    /// Islands built.
    pub islands: usize,
    /// Islands without a moving body.
    pub static_islands: usize,
    /// Bodies in the most populated island.
    pub most_bodies: usize,
    /// Joints in the most constrained island.
    pub most_joints: usize,
    /// Mean bodies per island.
    pub mean_bodies: f64,
    /// Mean joints per island.
    pub mean_joints: f64,
}

/// Disjoint-set forest over dense node indices.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn singletons(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
            size: vec![1; count],
        }
    }

    fn root(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            let grandparent = self.parent[self.parent[node]];
            self.parent[node] = grandparent;
            node = grandparent;
        }
        node
    }

    /// Join the sets holding `a` and `b`; false if they already shared one.
    fn merge(&mut self, a: usize, b: usize) -> bool {
        let (mut big, mut small) = (self.root(a), self.root(b));
        if big == small {
            return false;
        }
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }
}
