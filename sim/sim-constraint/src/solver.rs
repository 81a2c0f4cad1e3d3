//! Fixed-step driver for joint constraints.
//!
//! # Step Order
//!
//! 1. Add gravity to every dynamic body's velocity
//! 2. Group joints into islands; static islands are skipped
//! 3. Per island: `pre_solve` every joint once (warm start included),
//!    optionally validate, then run `velocity_iterations` sweeps of `solve`
//! 4. Integrate every body's pose from its corrected velocity
//!
//! Joints within an island are solved in input order, so results are
//! deterministic for a given joint ordering.

use sim_types::{BodySet, Result, SimulationConfig};

use crate::{ConstraintIslands, Joint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary of one [`JointSolver::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepStats {
    /// Islands found this step.
    pub islands: usize,
    /// Islands with at least one dynamic body.
    pub active_islands: usize,
    /// Joints that ran `pre_solve`/`solve`.
    pub joints_solved: usize,
    /// `solve` sweeps per island.
    pub iterations: usize,
    /// Joints that failed the validation pass (0 when validation is off).
    pub validation_failures: usize,
}

/// Steps a [`BodySet`] under a set of joints.
///
/// # Example
///
/// ```
/// use sim_constraint::{JointAnchors, JointSolver, LimitMotor, TranslationalConstraint};
/// use sim_types::{BodySet, MassProperties, Pose, RigidBody, SimulationConfig};
/// use nalgebra::{Point3, Vector3};
///
/// let mut bodies = BodySet::new();
/// let anchor = bodies.insert(RigidBody::fixed(Pose::identity()));
/// let bob = bodies.insert(
///     RigidBody::dynamic(
///         Pose::from_position(Point3::new(0.0, 0.0, -1.0)),
///         MassProperties::sphere(1.0, 0.1),
///     )
///     .expect("valid mass"),
/// );
///
/// // Rope of length 1 along Z.
/// let mut joints = vec![TranslationalConstraint::new(
///     anchor,
///     bob,
///     JointAnchors::centers(),
///     LimitMotor::new(Vector3::z()).with_limits(-1.0, 0.0),
/// )];
///
/// let mut solver = JointSolver::new(SimulationConfig::default()).expect("valid config");
/// for _ in 0..60 {
///     solver.step(&mut bodies, &mut joints);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JointSolver {
    config: SimulationConfig,
}

impl JointSolver {
    /// Create a solver from a validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance the simulation by one timestep.
    ///
    /// # Panics
    ///
    /// Panics if a joint references a body outside `bodies` or connects a
    /// body to itself.
    pub fn step<J: Joint>(&mut self, bodies: &mut BodySet, joints: &mut [J]) -> StepStats {
        let time_step = self.config.timestep;
        let inv_time_step = self.config.frequency();
        let solver = &self.config.solver;

        let gravity = self.config.gravity * time_step;
        for body in bodies.iter_mut().filter(|b| !b.is_static()) {
            body.linear_velocity += gravity;
        }

        let islands = ConstraintIslands::from_bodies(joints, bodies);
        let mut stats = StepStats {
            islands: islands.len(),
            active_islands: islands.active_count(),
            iterations: solver.velocity_iterations,
            ..StepStats::default()
        };

        for (index, island) in islands.active() {
            tracing::trace!(
                "island {}: {} bodies, {} joints",
                index,
                island.body_count(),
                island.joint_count()
            );

            for &j in &island.joints {
                joints[j].pre_solve(bodies, time_step, inv_time_step);
            }

            if solver.validate_constraints {
                for &j in &island.joints {
                    if let Err(err) = joints[j].validate() {
                        tracing::warn!(
                            "joint {} ({:?}) failed validation: {}",
                            j,
                            joints[j].joint_type(),
                            err
                        );
                        stats.validation_failures += 1;
                    }
                }
            }

            for _ in 0..solver.velocity_iterations {
                for &j in &island.joints {
                    joints[j].solve(bodies);
                }
            }
            stats.joints_solved += island.joint_count();
        }

        bodies.integrate(time_step);

        tracing::debug!(
            "step: {} joints in {}/{} active islands, {} iterations",
            stats.joints_solved,
            stats.active_islands,
            stats.islands,
            stats.iterations
        );
        stats
    }
}
