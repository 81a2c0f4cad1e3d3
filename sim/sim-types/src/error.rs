//! Errors raised outside the solver hot path.
//!
//! `pre_solve` and `solve` report nothing; a broken constraint shows up as
//! `NaN` in body velocities. These errors come from building bodies and
//! configs, from arena lookups, and from the opt-in validation pass.

use thiserror::Error;

/// Failure while building, configuring or validating a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A [`BodyId`](crate::BodyId) that is not in the arena.
    #[error("no body with index {0} in the arena")]
    InvalidBodyId(usize),

    /// Timestep that is zero, negative or not finite.
    #[error("timestep {0} is not a positive finite number")]
    InvalidTimestep(f64),

    /// A `NaN` or infinity reached constraint or body state.
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Which quantity went non-finite.
        reason: String,
    },

    /// The effective mass block is numerically singular.
    #[error("effective mass is ill-conditioned (reciprocal condition {reciprocal_condition:e})")]
    IllConditioned {
        /// `|det K| / (K00 K11 K22)`.
        reciprocal_condition: f64,
    },

    /// A configuration field is out of range.
    #[error("bad configuration: {reason}")]
    InvalidConfig {
        /// The offending field and its constraint.
        reason: String,
    },

    /// Mass or inertia that cannot describe a dynamic body.
    #[error("bad mass properties: {reason}")]
    InvalidMassProperties {
        /// The offending quantity.
        reason: String,
    },
}

impl SimError {
    /// [`SimError::Diverged`] with the given reason.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// [`SimError::InvalidConfig`] with the given reason.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// [`SimError::InvalidMassProperties`] with the given reason.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Non-finite state was detected.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// The caller passed a bad config or timestep.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidTimestep(_))
    }
}
