//! Cubic spline interpolation (scipy.interpolate.CubicSpline port).
//!
//! The spline is represented by the second derivative `M_i` at every knot. The
//! boundary condition supplies the two equations the interior continuity
//! conditions leave open.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Boundary condition at the two ends of the spline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryCondition {
    /// Third derivative continuous at the second and second-to-last knots.
    #[default]
    NotAKnot,
    /// Zero second derivative at both ends.
    Natural,
    /// Zero first derivative at both ends.
    Clamped,
}

/// Piecewise cubic interpolant through strictly increasing knots.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
    extrapolate: bool,
}

impl CubicSpline {
    /// Fit a spline through `(x, y)`.
    ///
    /// `x` must be strictly increasing with at least two knots. With `extrapolate`
    /// the end pieces extend past the knot range; without it `eval` returns `None`
    /// outside `[x[0], x[n-1]]`.
    pub fn new(x: &[f64], y: &[f64], bc: BoundaryCondition, extrapolate: bool) -> Result<Self> {
        let n = x.len();
        if n != y.len() {
            return Err(Error::FitError(format!(
                "x and y lengths differ: {} vs {}",
                n,
                y.len()
            )));
        }
        if n < 2 {
            return Err(Error::FitError(format!("spline needs at least 2 knots, got {}", n)));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(Error::FitError("knots must be finite".to_string()));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::FitError("knot x values must be strictly increasing".to_string()));
        }

        let m = solve_second_derivatives(x, y, bc)?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
            extrapolate,
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Value of the spline at `t`, or `None` outside the knot range when not extrapolating.
    pub fn eval(&self, t: f64) -> Option<f64> {
        let n = self.x.len();
        let (first, last) = (self.x[0], self.x[n - 1]);
        if !self.extrapolate && (t < first || t > last) {
            return None;
        }

        // Interval index, clamped to the end pieces for extrapolation
        let i = match self.x.partition_point(|&k| k <= t) {
            0 => 0,
            p => (p - 1).min(n - 2),
        };

        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let a = x1 - t;
        let b = t - x0;

        Some(
            m0 * a * a * a / (6.0 * h)
                + m1 * b * b * b / (6.0 * h)
                + (y0 / h - m0 * h / 6.0) * a
                + (y1 / h - m1 * h / 6.0) * b,
        )
    }
}

fn solve_second_derivatives(x: &[f64], y: &[f64], bc: BoundaryCondition) -> Result<Vec<f64>> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    // Two knots: a straight line unless the end slopes are pinned.
    if n == 2 && bc != BoundaryCondition::Clamped {
        return Ok(vec![0.0, 0.0]);
    }

    let mut a = DMatrix::zeros(n, n);
    let mut rhs = DVector::zeros(n);

    for i in 1..n - 1 {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];
        rhs[i] = 6.0 * (slope[i] - slope[i - 1]);
    }

    match bc {
        BoundaryCondition::Natural => {
            a[(0, 0)] = 1.0;
            a[(n - 1, n - 1)] = 1.0;
        }
        BoundaryCondition::Clamped => {
            a[(0, 0)] = 2.0 * h[0];
            a[(0, 1)] = h[0];
            rhs[0] = 6.0 * slope[0];
            a[(n - 1, n - 2)] = h[n - 2];
            a[(n - 1, n - 1)] = 2.0 * h[n - 2];
            rhs[n - 1] = -6.0 * slope[n - 2];
        }
        BoundaryCondition::NotAKnot if n == 3 => {
            // Both conditions coincide: the spline is the parabola through the knots
            a[(0, 0)] = 1.0;
            a[(0, 1)] = -1.0;
            a[(2, 1)] = 1.0;
            a[(2, 2)] = -1.0;
        }
        BoundaryCondition::NotAKnot => {
            a[(0, 0)] = h[1];
            a[(0, 1)] = -(h[0] + h[1]);
            a[(0, 2)] = h[0];
            a[(n - 1, n - 3)] = h[n - 2];
            a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
            a[(n - 1, n - 1)] = h[n - 3];
        }
    }

    let m = a
        .lu()
        .solve(&rhs)
        .ok_or_else(|| Error::FitError("singular spline system".to_string()))?;
    Ok(m.iter().cloned().collect())
}
