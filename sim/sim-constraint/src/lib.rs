//! Warm-started sequential impulse joint constraints.
//!
//! This crate provides joint constraints that couple pairs of rigid bodies
//! held in a [`BodySet`](sim_types::BodySet) arena. Every constrained axis
//! can carry a hard limit, a velocity motor, and a spring.
//!
//! # Constraint Types
//!
//! - [`Translational3Constraint`]: Point-to-point along three axes, coupled
//!   through a 3x3 effective mass block
//! - [`Rotational3Constraint`]: The angular counterpart
//! - [`TranslationalConstraint`]: Point-to-point along one axis
//! - [`PrismaticJoint`]: Slider built from the two three-axis blocks
//!
//! # Per-Axis Features
//!
//! Each axis is configured by a [`LimitMotor`]:
//! - **Limits**: `lower > upper` disables, `lower == upper` locks
//! - **Motors**: Target relative velocity under a force budget
//! - **Springs**: Soft limits through constraint force mixing
//!
//! # Step Contract
//!
//! ```text
//! pre_solve(dt, 1/dt)   once per substep: limits, Jacobians, K, warm start
//! solve()               once per iteration: motor, then coupled limit solve
//! integrate(dt)         caller advances poses from the new velocities
//! ```
//!
//! [`JointSolver`] runs this contract per [`ConstraintIslands`] island.
//!
//! # Failure Model
//!
//! `pre_solve` and `solve` never fail and never allocate. Degenerate input
//! (two static bodies, parallel axes) propagates `NaN`. Call `validate()`
//! after `pre_solve`, or enable
//! [`SolverConfig::validate_constraints`](sim_types::SolverConfig), to turn
//! such states into [`SimError`](sim_types::SimError)s.
//!
//! # Example
//!
//! ```
//! use sim_constraint::{JointAnchors, LimitMotor, LimitState, Translational3Constraint};
//! use sim_types::{BodySet, MassProperties, Pose, RigidBody};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = BodySet::new();
//! let a = bodies.insert(RigidBody::fixed(Pose::identity()));
//! let b = bodies.insert(
//!     RigidBody::dynamic(
//!         Pose::from_position(Point3::new(0.0, 0.0, 1.5)),
//!         MassProperties::sphere(1.0, 0.5),
//!     )
//!     .expect("valid mass"),
//! );
//!
//! let mut constraint = Translational3Constraint::new(
//!     a,
//!     b,
//!     JointAnchors::centers(),
//!     [
//!         LimitMotor::fixed(Vector3::x()),
//!         LimitMotor::fixed(Vector3::y()),
//!         LimitMotor::new(Vector3::z()).with_limits(0.0, 1.0),
//!     ],
//! );
//!
//! constraint.pre_solve(&mut bodies, 0.01, 100.0);
//! assert_eq!(constraint.axis_state(2).state, LimitState::AtUpper);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-constraint/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::suboptimal_flops)]

mod anchor;
mod axis;
mod block;
mod effective_mass;
mod islands;
mod jacobian;
mod joint;
mod limit_motor;
mod prismatic;
mod rotational;
mod single_axis;
mod solver;
mod translational;
mod validate;

pub use anchor::{AnchorWeighting, JointAnchors, WorldAnchors};
pub use axis::{AxisState, LimitState};
pub use effective_mass::{adjugate_inverse, ActiveAxes, EffectiveMass};
pub use islands::{ConstraintIslands, Island, IslandStatistics};
pub use jacobian::AxisJacobian;
pub use joint::{Joint, JointType};
pub use limit_motor::LimitMotor;
pub use prismatic::PrismaticJoint;
pub use rotational::Rotational3Constraint;
pub use single_axis::TranslationalConstraint;
pub use solver::{JointSolver, StepStats};
pub use translational::Translational3Constraint;
pub use validate::{ConditionReport, MIN_RECIPROCAL_CONDITION};

// Re-export types needed to build constraints
pub use sim_types::{BodyId, BodySet, Vector3};
