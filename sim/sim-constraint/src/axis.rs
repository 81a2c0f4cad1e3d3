//! Per-axis limit regime and step-scoped row data.
//!
//! Every constrained axis carries a small state machine ([`AxisState`])
//! that persists between steps for warm starting, and a row
//! ([`AxisRow`]) rebuilt by each `pre_solve`.

use std::f64::consts::TAU;

use crate::LimitMotor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which side of its limits an axis is on.
///
/// The state decides the sign a limit impulse may take: at the lower
/// limit the impulse may only push the offset up (non-positive impulse),
/// at the upper limit only down (non-negative impulse). A locked axis
/// accepts either sign, and a free axis carries no limit impulse at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitState {
    /// Lower and upper limits coincide; the axis is rigid.
    Locked,
    /// The offset is below the lower limit.
    AtLower,
    /// The offset is above the upper limit.
    AtUpper,
    /// Within range, or no limit configured.
    #[default]
    Free,
}

impl LimitState {
    /// The sign an accumulated limit impulse must share (0 when unrestricted).
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::AtLower => -1.0,
            Self::AtUpper => 1.0,
            Self::Locked | Self::Free => 0.0,
        }
    }

    /// Whether the axis is free.
    #[must_use]
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    /// Whether an accumulated limit impulse is illegal in this state and
    /// must be cancelled back to zero.
    #[must_use]
    pub fn rejects(self, impulse: f64) -> bool {
        match self {
            Self::Free => true,
            Self::Locked => false,
            Self::AtLower | Self::AtUpper => impulse * self.sign() < 0.0,
        }
    }
}

/// Persistent per-axis solver state.
///
/// Invariant: whenever `state` changes, `limit_impulse` is reset to zero so
/// an impulse accumulated under one regime never biases another.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisState {
    /// Current limit regime.
    pub state: LimitState,
    /// Accumulated limit impulse.
    pub limit_impulse: f64,
    /// Accumulated motor impulse.
    pub motor_impulse: f64,
}

impl AxisState {
    /// Sum of limit and motor impulse, used for warm starting.
    #[must_use]
    pub fn total_impulse(&self) -> f64 {
        self.limit_impulse + self.motor_impulse
    }

    fn enter(&mut self, state: LimitState) {
        if self.state != state {
            self.state = state;
            self.limit_impulse = 0.0;
        }
    }

    fn release(&mut self) {
        self.state = LimitState::Free;
        self.limit_impulse = 0.0;
    }
}

/// Step-scoped data for one axis, rebuilt by every `pre_solve`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct AxisRow {
    /// Target relative velocity pushing the axis back toward its limit.
    pub bias: f64,
    /// Constraint force mixing added to the effective mass diagonal.
    pub cfm: f64,
    /// Active spring as `(frequency, damping_ratio)`.
    pub spring: Option<(f64, f64)>,
    pub motor_enabled: bool,
    pub motor_speed: f64,
    pub max_motor_impulse: f64,
}

/// Guards applied while classifying an axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisGuards {
    /// Springs are dropped beyond this offset magnitude.
    pub spring_offset_limit: f64,
    /// Dead zone on the positional error of non-spring axes.
    pub slop: f64,
}

impl AxisRow {
    /// Classify `position` against the limits of `motor`, updating `axis`,
    /// and build the unsoftened row.
    ///
    /// Also returns the offset at which the constraint frame should be
    /// built: the limit itself when a hard (non-spring) limit is active,
    /// the raw position otherwise.
    pub(crate) fn classify(
        axis: &mut AxisState,
        motor: &LimitMotor,
        position: f64,
        guards: AxisGuards,
        time_step: f64,
    ) -> (Self, f64) {
        let spring = motor.spring_enabled() && position.abs() <= guards.spring_offset_limit;
        let mut bias = 0.0;
        let mut surface = position;

        if motor.has_limit() {
            let target = if motor.is_locked() {
                axis.enter(LimitState::Locked);
                Some(motor.lower_limit)
            } else if position < motor.lower_limit {
                axis.enter(LimitState::AtLower);
                Some(motor.lower_limit)
            } else if position > motor.upper_limit {
                axis.enter(LimitState::AtUpper);
                Some(motor.upper_limit)
            } else {
                axis.release();
                None
            };

            if let Some(target) = target {
                bias = target - position;
                if !spring {
                    surface = target;
                }
            }
            if !spring {
                bias = dead_zone(bias, guards.slop);
            }
        } else {
            axis.release();
        }

        let motor_enabled =
            motor.motor_enabled() && (axis.state != LimitState::Locked || spring);
        if !motor_enabled {
            axis.motor_impulse = 0.0;
        }

        let row = Self {
            bias,
            cfm: 0.0,
            spring: spring.then_some((motor.frequency, motor.damping_ratio)),
            motor_enabled,
            motor_speed: motor.motor_speed,
            max_motor_impulse: if motor_enabled {
                motor.max_motor_force * time_step
            } else {
                0.0
            },
        };
        (row, surface)
    }

    /// Turn the positional error into a bias velocity, softening the row
    /// with a spring when one is active and the axis is off-center.
    ///
    /// `diagonal` is the axis' effective mass entry before any CFM.
    pub(crate) fn soften(
        &mut self,
        state: LimitState,
        diagonal: f64,
        time_step: f64,
        inv_time_step: f64,
        baumgarte: f64,
    ) {
        match self.spring {
            Some((frequency, damping_ratio)) if !state.is_free() => {
                let omega = TAU * frequency;
                let k = omega * omega * time_step;
                let dmp = inv_time_step / (k + 2.0 * damping_ratio * omega);
                self.cfm = diagonal * dmp;
                self.bias *= k * dmp;
            }
            _ => {
                self.cfm = 0.0;
                self.bias *= inv_time_step * baumgarte;
            }
        }
    }

    /// Accumulate the motor impulse that drives `relative_velocity` to the
    /// motor speed, clamped to the step budget. Returns the delta applied.
    pub(crate) fn drive(
        &self,
        axis: &mut AxisState,
        relative_velocity: f64,
        inv_diagonal: f64,
    ) -> f64 {
        if !self.motor_enabled {
            return 0.0;
        }
        let old = axis.motor_impulse;
        let wanted = old + (relative_velocity - self.motor_speed) * inv_diagonal;
        axis.motor_impulse = clamp_symmetric(wanted, self.max_motor_impulse);
        axis.motor_impulse - old
    }
}

/// Shrink `value` toward zero by `slop`, snapping to zero inside the band.
pub(crate) fn dead_zone(value: f64, slop: f64) -> f64 {
    if value > slop {
        value - slop
    } else if value < -slop {
        value + slop
    } else {
        0.0
    }
}

/// Clamp into `[-bound, bound]`, passing `NaN` through instead of panicking.
pub(crate) fn clamp_symmetric(value: f64, bound: f64) -> f64 {
    if value > bound {
        bound
    } else if value < -bound {
        -bound
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const GUARDS: AxisGuards = AxisGuards {
        spring_offset_limit: 20.0,
        slop: 0.005,
    };

    fn classify(axis: &mut AxisState, motor: &LimitMotor, position: f64) -> (AxisRow, f64) {
        AxisRow::classify(axis, motor, position, GUARDS, 0.01)
    }

    #[test]
    fn test_limit_state_signs() {
        assert!(LimitState::Free.rejects(0.0));
        assert!(!LimitState::Locked.rejects(-5.0));
        assert!(!LimitState::Locked.rejects(5.0));
        assert!(LimitState::AtLower.rejects(0.1));
        assert!(!LimitState::AtLower.rejects(-0.1));
        assert!(!LimitState::AtLower.rejects(0.0));
        assert!(LimitState::AtUpper.rejects(-0.1));
        assert!(!LimitState::AtUpper.rejects(0.1));
    }

    #[test]
    fn test_unlimited_axis_is_free() {
        let mut axis = AxisState {
            state: LimitState::AtUpper,
            limit_impulse: 3.0,
            motor_impulse: 0.0,
        };
        let (row, surface) = classify(&mut axis, &LimitMotor::new(Vector3::x()), 2.0);

        assert_eq!(axis.state, LimitState::Free);
        assert_relative_eq!(axis.limit_impulse, 0.0);
        assert_relative_eq!(row.bias, 0.0);
        assert_relative_eq!(surface, 2.0);
    }

    #[test]
    fn test_locked_axis_bias_and_surface() {
        let mut axis = AxisState::default();
        let motor = LimitMotor::new(Vector3::x()).with_limits(0.5, 0.5);
        let (row, surface) = classify(&mut axis, &motor, 0.3);

        assert_eq!(axis.state, LimitState::Locked);
        // 0.2 error minus 0.005 slop
        assert_relative_eq!(row.bias, 0.195, epsilon = 1e-12);
        assert_relative_eq!(surface, 0.5);
    }

    #[test]
    fn test_lower_and_upper_regimes() {
        let motor = LimitMotor::new(Vector3::x()).with_limits(-1.0, 1.0);

        let mut axis = AxisState::default();
        let (row, _) = classify(&mut axis, &motor, -1.5);
        assert_eq!(axis.state, LimitState::AtLower);
        assert!(row.bias > 0.0);

        let (row, surface) = classify(&mut axis, &motor, 1.5);
        assert_eq!(axis.state, LimitState::AtUpper);
        assert!(row.bias < 0.0);
        assert_relative_eq!(surface, 1.0);

        // Exactly at the limit counts as free.
        let (row, _) = classify(&mut axis, &motor, 1.0);
        assert_eq!(axis.state, LimitState::Free);
        assert_relative_eq!(row.bias, 0.0);
    }

    #[test]
    fn test_regime_change_resets_limit_impulse_only() {
        let motor = LimitMotor::new(Vector3::x()).with_limits(-1.0, 1.0);
        let mut axis = AxisState {
            state: LimitState::AtLower,
            limit_impulse: -2.0,
            motor_impulse: 0.0,
        };

        classify(&mut axis, &motor, -1.2);
        assert_relative_eq!(axis.limit_impulse, -2.0);

        classify(&mut axis, &motor, 1.2);
        assert_eq!(axis.state, LimitState::AtUpper);
        assert_relative_eq!(axis.limit_impulse, 0.0);
    }

    #[test]
    fn test_motor_gating() {
        let mut axis = AxisState {
            motor_impulse: 4.0,
            ..Default::default()
        };
        let locked = LimitMotor::fixed(Vector3::x()).with_motor(1.0, 10.0);
        let (row, _) = classify(&mut axis, &locked, 0.0);
        assert!(!row.motor_enabled);
        assert_relative_eq!(axis.motor_impulse, 0.0);

        let sprung = locked.with_spring(2.0, 1.0);
        let (row, _) = classify(&mut axis, &sprung, 0.0);
        assert!(row.motor_enabled);
        assert_relative_eq!(row.max_motor_impulse, 0.1, epsilon = 1e-12);

        let free = LimitMotor::new(Vector3::x()).with_motor(1.0, 10.0);
        let (row, _) = classify(&mut axis, &free, 3.0);
        assert!(row.motor_enabled);
    }

    #[test]
    fn test_spring_guard_and_softening() {
        let motor = LimitMotor::fixed(Vector3::x()).with_spring(1.0, 0.5);
        let mut axis = AxisState::default();

        let (row, _) = classify(&mut axis, &motor, 25.0);
        assert!(row.spring.is_none());

        let (mut row, surface) = classify(&mut axis, &motor, 0.1);
        assert!(row.spring.is_some());
        // Springs keep the raw offset and skip the dead zone.
        assert_relative_eq!(surface, 0.1);
        assert_relative_eq!(row.bias, -0.1);

        let (dt, inv_dt) = (0.01, 100.0);
        row.soften(axis.state, 2.0, dt, inv_dt, 0.05);
        let omega = TAU;
        let k = omega * omega * dt;
        let dmp = inv_dt / (k + omega);
        assert_relative_eq!(row.cfm, 2.0 * dmp, epsilon = 1e-12);
        assert_relative_eq!(row.bias, -0.1 * k * dmp, epsilon = 1e-12);
    }

    #[test]
    fn test_soften_without_spring_uses_baumgarte() {
        let mut row = AxisRow {
            bias: 0.2,
            ..Default::default()
        };
        row.soften(LimitState::Locked, 2.0, 0.01, 100.0, 0.05);
        assert_relative_eq!(row.cfm, 0.0);
        assert_relative_eq!(row.bias, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drive_clamps_to_budget() {
        let row = AxisRow {
            motor_enabled: true,
            motor_speed: 1.0,
            max_motor_impulse: 0.25,
            ..Default::default()
        };
        let mut axis = AxisState::default();

        // rv = -9 wants impulse (-9 - 1) / 2 = -5
        let delta = row.drive(&mut axis, -9.0, 0.5);
        assert_relative_eq!(delta, -0.25);
        assert_relative_eq!(axis.motor_impulse, -0.25);

        // Nothing more left in the budget.
        let delta = row.drive(&mut axis, -9.0, 0.5);
        assert_relative_eq!(delta, 0.0);
    }

    #[test]
    fn test_dead_zone_and_clamp() {
        assert_relative_eq!(dead_zone(0.01, 0.005), 0.005);
        assert_relative_eq!(dead_zone(-0.01, 0.005), -0.005);
        assert_relative_eq!(dead_zone(0.004, 0.005), 0.0);
        assert_relative_eq!(clamp_symmetric(3.0, 1.0), 1.0);
        assert_relative_eq!(clamp_symmetric(-3.0, 1.0), -1.0);
        assert!(clamp_symmetric(f64::NAN, 1.0).is_nan());
    }
}
