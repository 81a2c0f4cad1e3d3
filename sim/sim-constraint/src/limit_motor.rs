//! Per-axis limit, motor and spring configuration.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of one constrained axis.
///
/// A constraint reads every field on each `pre_solve`, so changing a
/// `LimitMotor` between steps (a slider moving `motor_speed`, say) takes
/// effect on the next step.
///
/// Limits use the engine-wide sentinel convention:
///
/// - `lower_limit > upper_limit`: no hard limit, the axis is free
/// - `lower_limit == upper_limit`: the axis is locked at that offset
/// - otherwise: the offset is kept within `[lower_limit, upper_limit]`
///
/// # Example
///
/// ```
/// use sim_constraint::LimitMotor;
/// use nalgebra::Vector3;
///
/// let slide = LimitMotor::new(Vector3::x())
///     .with_limits(-0.5, 0.5)
///     .with_motor(1.0, 200.0);
/// assert!(slide.has_limit());
/// assert!(slide.motor_enabled());
///
/// let locked = LimitMotor::fixed(Vector3::y());
/// assert!(locked.is_locked());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimitMotor {
    /// Unit direction in world space. Kept normalized by the caller.
    pub axis: Vector3<f64>,
    /// Current rotation about `axis` (radians).
    ///
    /// Only rotational constraints read this; the owning joint writes it
    /// before every `pre_solve`.
    pub angle: f64,
    /// Lower bound of the offset along `axis`.
    pub lower_limit: f64,
    /// Upper bound of the offset along `axis`.
    pub upper_limit: f64,
    /// Target relative velocity of the motor.
    pub motor_speed: f64,
    /// Maximum motor force; the motor is enabled iff this is positive.
    pub max_motor_force: f64,
    /// Spring frequency (Hz); 0 disables the spring.
    pub frequency: f64,
    /// Spring damping ratio (1 = critical).
    pub damping_ratio: f64,
}

impl LimitMotor {
    /// Create an unconstrained axis: no limit, no motor, no spring.
    #[must_use]
    pub fn new(axis: Vector3<f64>) -> Self {
        Self {
            axis,
            angle: 0.0,
            lower_limit: 0.0,
            upper_limit: -1.0,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            frequency: 0.0,
            damping_ratio: 0.0,
        }
    }

    /// Create an axis locked at zero offset.
    #[must_use]
    pub fn fixed(axis: Vector3<f64>) -> Self {
        Self::new(axis).with_limits(0.0, 0.0)
    }

    /// Set the limit range.
    ///
    /// Passing `lower > upper` disables the hard limit.
    #[must_use]
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.set_limits(lower, upper);
        self
    }

    /// Set the motor target speed and force budget.
    #[must_use]
    pub fn with_motor(mut self, speed: f64, max_force: f64) -> Self {
        self.set_motor(speed, max_force);
        self
    }

    /// Set the spring frequency and damping ratio.
    #[must_use]
    pub fn with_spring(mut self, frequency: f64, damping_ratio: f64) -> Self {
        self.set_spring(frequency, damping_ratio);
        self
    }

    /// Set the limit range in place.
    pub fn set_limits(&mut self, lower: f64, upper: f64) {
        self.lower_limit = lower;
        self.upper_limit = upper;
    }

    /// Remove the hard limit.
    pub fn clear_limits(&mut self) {
        self.set_limits(0.0, -1.0);
    }

    /// Set the motor in place.
    pub fn set_motor(&mut self, speed: f64, max_force: f64) {
        self.motor_speed = speed;
        self.max_motor_force = max_force;
    }

    /// Set the spring in place.
    pub fn set_spring(&mut self, frequency: f64, damping_ratio: f64) {
        self.frequency = frequency;
        self.damping_ratio = damping_ratio;
    }

    /// Whether a hard limit applies.
    #[must_use]
    pub fn has_limit(&self) -> bool {
        self.lower_limit <= self.upper_limit
    }

    /// Whether the axis is locked (lower and upper limits coincide).
    #[must_use]
    pub fn is_locked(&self) -> bool {
        (self.upper_limit - self.lower_limit).abs() <= f64::EPSILON
    }

    /// Whether the motor is configured.
    #[must_use]
    pub fn motor_enabled(&self) -> bool {
        self.max_motor_force > 0.0
    }

    /// Whether a spring is configured.
    ///
    /// The spring only acts while the axis is at or beyond a limit.
    #[must_use]
    pub fn spring_enabled(&self) -> bool {
        self.frequency > 0.0
    }
}
