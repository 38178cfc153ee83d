//! Ordinary least squares for a straight line.
//!
//! The standard curve is the classic two-parameter regression:
//!
//! ```text
//! minimize Σ (y_i - (β0 + β1 x_i))^2
//! ```
//!
//! We build the `n × 2` design matrix `[1, x_i]` and solve it with SVD, which
//! stays well-behaved for tall systems (many standards, two unknowns).
//! Rank deficiency (all `x_i` equal) is rejected before solving, since SVD
//! would otherwise silently return the minimum-norm solution.

use nalgebra::{DMatrix, DVector};

/// Intercept and slope of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// Returns `None` when fewer than two points are given, the slices differ in
/// length, or the `x` values do not span at least two distinct values.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() != y.len() || x.len() < 2 || count_distinct(x) < 2 {
        return None;
    }

    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &target)?;
    Some(LineFit {
        intercept: beta[0],
        slope: beta[1],
    })
}

/// Number of distinct values, compared with a relative tolerance.
pub fn count_distinct(values: &[f64]) -> usize {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut distinct = 0usize;
    let mut last: Option<f64> = None;
    for v in sorted {
        let is_new = match last {
            None => true,
            Some(prev) => (v - prev).abs() > 1e-12 * prev.abs().max(v.abs()).max(1.0),
        };
        if is_new {
            distinct += 1;
            last = Some(v);
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_matches_closed_form() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.1, 3.9, 6.2, 7.8];
        let fit = fit_line(&x, &y).unwrap();

        // Closed form: slope = Sxy / Sxx
        let mx = 2.5;
        let my = (2.1 + 3.9 + 6.2 + 7.8) / 4.0;
        let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
        let sxx: f64 = x.iter().map(|a| (a - mx) * (a - mx)).sum();
        let slope = sxy / sxx;
        assert!((fit.slope - slope).abs() < 1e-10);
        assert!((fit.intercept - (my - slope * mx)).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_single_x_value() {
        assert!(fit_line(&[5.0, 5.0, 5.0], &[0.1, 0.2, 0.3]).is_none());
        assert!(fit_line(&[5.0], &[0.1]).is_none());
    }

    #[test]
    fn distinct_count_ignores_non_finite() {
        assert_eq!(count_distinct(&[0.0, 0.0, 1.0, f64::NAN, 2.0]), 3);
    }
}
