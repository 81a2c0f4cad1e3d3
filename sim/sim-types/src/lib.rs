//! Core types for joint constraint simulation.
//!
//! This crate provides the foundational types the constraint solvers work on:
//!
//! - [`RigidBody`] - Pose, velocities, inverse mass and inertia of a body
//! - [`BodySet`] - Arena owning every body, addressed by [`BodyId`]
//! - [`SimulationConfig`] - Timestep, gravity, solver settings
//! - [`ConstraintTuning`] - Stability guards used while preparing constraints
//! - [`SimError`] - Errors from construction, configuration and validation
//!
//! # Design Philosophy
//!
//! These types are **pure data** plus the small amount of kinematics a body
//! needs to advance itself. Constraints read inverse mass and inertia and
//! write velocities directly; there is no setter indirection.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{BodySet, MassProperties, Pose, RigidBody};
//! use nalgebra::Point3;
//!
//! let mut bodies = BodySet::new();
//! let ground = bodies.insert(RigidBody::fixed(Pose::identity()));
//! let block = bodies.insert(
//!     RigidBody::dynamic(
//!         Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
//!         MassProperties::sphere(1.0, 0.5),
//!     )
//!     .expect("valid mass"),
//! );
//!
//! assert!(bodies.get(ground).is_some_and(RigidBody::is_static));
//! assert!(!bodies.get(block).is_some_and(RigidBody::is_static));
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod set;

pub use body::{BodyId, MassProperties, Pose, RigidBody};
pub use config::{ConstraintTuning, SimulationConfig, SolverConfig};
pub use error::SimError;
pub use set::BodySet;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
