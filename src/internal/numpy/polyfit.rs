//! Least-squares polynomial fitting (numpy.polyfit / numpy.poly1d port).

use nalgebra::{DMatrix, DVector};

use crate::{Error, Result};

/// Singular values below this (relative) threshold are treated as zero.
const SVD_EPSILON: f64 = 1e-12;

/// Polynomial with coefficients stored lowest degree first.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Coefficients, lowest degree first (`c0 + c1 x + c2 x^2 ...`).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate with Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }
}

/// Fit a polynomial of `degree` to `(x, y)` in the weighted least-squares sense.
///
/// Each residual is multiplied by `sqrt(weight)`, so an integer weight `k` is the
/// same as repeating that sample `k` times. Columns of the Vandermonde matrix are
/// scaled to unit norm before solving, as numpy does.
pub fn polyfit(x: &[f64], y: &[f64], weights: Option<&[f64]>, degree: usize) -> Result<Polynomial> {
    let n = x.len();
    if n != y.len() {
        return Err(Error::FitError(format!(
            "x and y lengths differ: {} vs {}",
            n,
            y.len()
        )));
    }
    if let Some(w) = weights {
        if w.len() != n {
            return Err(Error::FitError(format!(
                "weights length {} doesn't match {} samples",
                w.len(),
                n
            )));
        }
        if w.iter().any(|&wi| !(wi.is_finite() && wi >= 0.0)) {
            return Err(Error::FitError("weights must be finite and non-negative".to_string()));
        }
    }
    if n < degree + 1 {
        return Err(Error::FitError(format!(
            "degree {} fit needs at least {} samples, got {}",
            degree,
            degree + 1,
            n
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(Error::FitError("samples must be finite".to_string()));
    }

    let cols = degree + 1;
    let mut lhs = DMatrix::zeros(n, cols);
    let mut rhs = DVector::zeros(n);
    for i in 0..n {
        let sqrt_w = weights.map(|w| w[i].sqrt()).unwrap_or(1.0);
        let mut power = 1.0;
        for j in 0..cols {
            lhs[(i, j)] = power * sqrt_w;
            power *= x[i];
        }
        rhs[i] = y[i] * sqrt_w;
    }

    let mut scale = vec![1.0; cols];
    for j in 0..cols {
        let norm = lhs.column(j).norm();
        if norm > 0.0 {
            scale[j] = norm;
            lhs.column_mut(j).unscale_mut(norm);
        }
    }

    let solution = lhs
        .svd(true, true)
        .solve(&rhs, SVD_EPSILON)
        .map_err(|e| Error::FitError(e.to_string()))?;

    let coefficients: Vec<f64> = solution
        .iter()
        .zip(scale.iter())
        .map(|(c, s)| c / s)
        .collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(Error::FitError("fit produced non-finite coefficients".to_string()));
    }

    Ok(Polynomial::new(coefficients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polynomial_eval() {
        // 1 + 2x + 3x^2
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.degree(), 2);
        assert_relative_eq!(p.eval(0.0), 1.0);
        assert_relative_eq!(p.eval(2.0), 17.0);
        assert_relative_eq!(p.eval(-1.0), 2.0);
    }

    #[test]
    fn test_polyfit_exact_parabola() {
        let x = [-1.0, 0.0, 1.0];
        let y = [1.0, 0.0, 1.0];
        let p = polyfit(&x, &y, None, 2).unwrap();
        let c = p.coefficients();
        assert_relative_eq!(c[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(c[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(c[2], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polyfit_line_least_squares() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let p = polyfit(&x, &y, None, 1).unwrap();
        assert_relative_eq!(p.coefficients()[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.coefficients()[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polyfit_integer_weights_match_duplication() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 2.0, 1.0, 4.0];
        let weighted = polyfit(&x, &y, Some(&[1.0, 2.0, 4.0, 8.0]), 1).unwrap();

        let mut dup_x = Vec::new();
        let mut dup_y = Vec::new();
        for (i, reps) in [1, 2, 4, 8].iter().enumerate() {
            for _ in 0..*reps {
                dup_x.push(x[i]);
                dup_y.push(y[i]);
            }
        }
        let duplicated = polyfit(&dup_x, &dup_y, None, 1).unwrap();

        for (a, b) in weighted.coefficients().iter().zip(duplicated.coefficients()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_polyfit_rejects_bad_input() {
        assert!(polyfit(&[0.0, 1.0], &[0.0], None, 1).is_err());
        assert!(polyfit(&[0.0, 1.0], &[0.0, 1.0], None, 2).is_err());
        assert!(polyfit(&[0.0, 1.0], &[0.0, 1.0], Some(&[1.0]), 1).is_err());
        assert!(polyfit(&[0.0, f64::NAN], &[0.0, 1.0], None, 1).is_err());
    }
}
