//! The 3x3 effective mass block and its reduced solves.
//!
//! `K` couples the three axes of a constraint through shared bodies. Its
//! inverse is formed once per `pre_solve` by the adjugate. When some axes
//! are clamped during a solve iteration the remaining ones are re-solved
//! with closed-form 2x2 or 1x1 systems picked by [`ActiveAxes`].

use nalgebra::{Matrix3, Vector3};

/// Which axes still take part in a limit solve after clamping.
///
/// Axis indices are `0..3`. Pairs are stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveAxes {
    /// Nothing clamped; the full 3x3 inverse applies.
    All,
    /// One axis clamped; solve the 2x2 system of the other two.
    Pair(usize, usize),
    /// Two axes clamped; solve the remaining axis alone.
    Single(usize),
    /// Every axis clamped.
    Empty,
}

impl ActiveAxes {
    /// Pick the reduced system from the per-axis clamp flags.
    #[must_use]
    pub fn from_clamped(clamped: [bool; 3]) -> Self {
        match clamped {
            [false, false, false] => Self::All,
            [true, false, false] => Self::Pair(1, 2),
            [false, true, false] => Self::Pair(0, 2),
            [false, false, true] => Self::Pair(0, 1),
            [true, true, false] => Self::Single(2),
            [true, false, true] => Self::Single(1),
            [false, true, true] => Self::Single(0),
            [true, true, true] => Self::Empty,
        }
    }

    /// Whether axis `i` is solved.
    #[must_use]
    pub fn contains(self, i: usize) -> bool {
        match self {
            Self::All => i < 3,
            Self::Pair(a, b) => i == a || i == b,
            Self::Single(a) => i == a,
            Self::Empty => false,
        }
    }
}

/// Effective mass of a three-axis constraint for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectiveMass {
    coupling: Matrix3<f64>,
    matrix: Matrix3<f64>,
    inverse_diagonal: Vector3<f64>,
    inverse: Matrix3<f64>,
}

impl EffectiveMass {
    /// Build from the raw coupling matrix and the per-axis CFM added to
    /// its diagonal.
    #[must_use]
    pub fn new(coupling: Matrix3<f64>, cfm: &Vector3<f64>) -> Self {
        let mut matrix = coupling;
        for i in 0..3 {
            matrix[(i, i)] += cfm[i];
        }
        Self {
            coupling,
            matrix,
            inverse_diagonal: coupling.diagonal().map(|k| 1.0 / k),
            inverse: adjugate_inverse(&matrix),
        }
    }

    /// `K` including CFM; the matrix the limit solve inverts.
    #[must_use]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// `K` without CFM, used to feed motor impulses back into the
    /// relative velocity.
    #[must_use]
    pub fn coupling(&self) -> &Matrix3<f64> {
        &self.coupling
    }

    /// Diagonal of `K` before CFM.
    #[must_use]
    pub fn diagonal(&self) -> Vector3<f64> {
        self.coupling.diagonal()
    }

    /// Reciprocals of [`diagonal`](Self::diagonal), used by motors.
    #[must_use]
    pub fn inverse_diagonal(&self) -> &Vector3<f64> {
        &self.inverse_diagonal
    }

    /// Adjugate inverse of [`matrix`](Self::matrix).
    #[must_use]
    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    /// `det K`.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// `|det K| / (K00·K11·K22)`.
    ///
    /// 1 for a diagonal matrix, approaching 0 as the axes become dependent.
    #[must_use]
    pub fn reciprocal_condition(&self) -> f64 {
        let diagonal = self.matrix.diagonal();
        self.determinant().abs() / (diagonal.x * diagonal.y * diagonal.z)
    }

    /// Impulse that cancels `rv` on the `active` axes, holding the others
    /// at zero.
    #[must_use]
    pub fn solve(&self, active: ActiveAxes, rv: &Vector3<f64>) -> Vector3<f64> {
        let k = &self.matrix;
        let mut delta = Vector3::zeros();
        match active {
            ActiveAxes::All => delta = self.inverse * rv,
            ActiveAxes::Pair(i, j) => {
                let det = 1.0 / (k[(i, i)] * k[(j, j)] - k[(i, j)] * k[(j, i)]);
                delta[i] = (k[(j, j)] * rv[i] - k[(i, j)] * rv[j]) * det;
                delta[j] = (-k[(j, i)] * rv[i] + k[(i, i)] * rv[j]) * det;
            }
            ActiveAxes::Single(i) => delta[i] = rv[i] / k[(i, i)],
            ActiveAxes::Empty => {}
        }
        delta
    }
}

/// Invert a 3x3 matrix by its adjugate.
///
/// No pivoting and no singularity check: a singular input yields
/// non-finite entries.
#[must_use]
pub fn adjugate_inverse(k: &Matrix3<f64>) -> Matrix3<f64> {
    let (k00, k01, k02) = (k[(0, 0)], k[(0, 1)], k[(0, 2)]);
    let (k10, k11, k12) = (k[(1, 0)], k[(1, 1)], k[(1, 2)]);
    let (k20, k21, k22) = (k[(2, 0)], k[(2, 1)], k[(2, 2)]);

    let inv = 1.0
        / (k00 * (k11 * k22 - k21 * k12)
            + k10 * (k21 * k02 - k01 * k22)
            + k20 * (k01 * k12 - k11 * k02));

    Matrix3::new(
        k11 * k22 - k12 * k21,
        k02 * k21 - k01 * k22,
        k01 * k12 - k02 * k11,
        k12 * k20 - k10 * k22,
        k00 * k22 - k02 * k20,
        k02 * k10 - k00 * k12,
        k10 * k21 - k11 * k20,
        k01 * k20 - k00 * k21,
        k00 * k11 - k01 * k10,
    ) * inv
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix2;

    fn sample() -> Matrix3<f64> {
        Matrix3::new(4.0, 1.0, 0.5, 1.0, 3.0, 0.25, 0.5, 0.25, 2.0)
    }

    #[test]
    fn test_adjugate_matches_nalgebra() {
        let k = sample();
        let ours = adjugate_inverse(&k);
        let reference = k.try_inverse().unwrap();
        assert_relative_eq!(ours, reference, epsilon = 1e-12);
        assert_relative_eq!(ours * k, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_adjugate_of_singular_is_not_finite() {
        let k = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0);
        assert!(adjugate_inverse(&k).iter().any(|x| !x.is_finite()));
    }

    #[test]
    fn test_active_axes_mapping() {
        use ActiveAxes::{All, Empty, Pair, Single};
        assert_eq!(ActiveAxes::from_clamped([false, false, false]), All);
        assert_eq!(ActiveAxes::from_clamped([true, false, false]), Pair(1, 2));
        assert_eq!(ActiveAxes::from_clamped([false, true, false]), Pair(0, 2));
        assert_eq!(ActiveAxes::from_clamped([false, false, true]), Pair(0, 1));
        assert_eq!(ActiveAxes::from_clamped([true, true, false]), Single(2));
        assert_eq!(ActiveAxes::from_clamped([true, false, true]), Single(1));
        assert_eq!(ActiveAxes::from_clamped([false, true, true]), Single(0));
        assert_eq!(ActiveAxes::from_clamped([true, true, true]), Empty);

        assert!(Pair(0, 2).contains(2));
        assert!(!Pair(0, 2).contains(1));
        assert!(!Empty.contains(0));
    }

    #[test]
    fn test_cfm_only_touches_diagonal() {
        let k = sample();
        let mass = EffectiveMass::new(k, &Vector3::new(0.5, 0.0, 1.0));

        assert_relative_eq!(mass.matrix()[(0, 0)], 4.5);
        assert_relative_eq!(mass.matrix()[(2, 2)], 3.0);
        assert_relative_eq!(mass.matrix()[(0, 1)], 1.0);
        assert_relative_eq!(mass.diagonal(), Vector3::new(4.0, 3.0, 2.0));
        assert_relative_eq!(mass.inverse_diagonal().x, 0.25);
    }

    #[test]
    fn test_pair_solves_match_sub_inverse() {
        let mass = EffectiveMass::new(sample(), &Vector3::zeros());
        let rv = Vector3::new(0.3, -1.2, 0.7);
        let k = mass.matrix();

        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let sub = Matrix2::new(k[(i, i)], k[(i, j)], k[(j, i)], k[(j, j)]);
            let expected = sub.try_inverse().unwrap() * nalgebra::Vector2::new(rv[i], rv[j]);
            let delta = mass.solve(ActiveAxes::Pair(i, j), &rv);

            assert_relative_eq!(delta[i], expected.x, epsilon = 1e-12);
            assert_relative_eq!(delta[j], expected.y, epsilon = 1e-12);
            assert_relative_eq!(delta[3 - i - j], 0.0);
        }
    }

    #[test]
    fn test_single_and_full_solves() {
        let mass = EffectiveMass::new(sample(), &Vector3::zeros());
        let rv = Vector3::new(0.3, -1.2, 0.7);

        let single = mass.solve(ActiveAxes::Single(1), &rv);
        assert_relative_eq!(single, Vector3::new(0.0, -0.4, 0.0), epsilon = 1e-12);

        let full = mass.solve(ActiveAxes::All, &rv);
        assert_relative_eq!(mass.matrix() * full, rv, epsilon = 1e-12);

        assert_eq!(mass.solve(ActiveAxes::Empty, &rv), Vector3::zeros());
    }

    #[test]
    fn test_reciprocal_condition() {
        let diagonal = EffectiveMass::new(
            Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 4.0)),
            &Vector3::zeros(),
        );
        assert_relative_eq!(diagonal.reciprocal_condition(), 1.0, epsilon = 1e-12);

        #[rustfmt::skip]
        let nearly_dependent = Matrix3::new(
            1.0, 1.0 - 1e-12, 0.0,
            1.0 - 1e-12, 1.0, 0.0,
            0.0, 0.0, 1.0,
        );
        let mass = EffectiveMass::new(nearly_dependent, &Vector3::zeros());
        assert!(mass.reciprocal_condition() < 1e-9);
    }
}
