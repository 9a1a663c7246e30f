//! Least squares solvers.
//!
//! The ridge regressor repeatedly solves small dense problems of the form:
//!
//! ```text
//! minimize ||X β - y||² + λ ||β - β₀||²
//! ```
//!
//! where `β₀` is zero for a fresh fit and the previous coefficients when fine-tuning.
//!
//! Implementation choices:
//! - The penalty is folded into the design by appending `sqrt(λ)·I` rows (and
//!   `sqrt(λ)·β₀` targets), so one SVD least-squares solve handles both cases.
//! - SVD is used rather than QR because the augmented design is tall; nalgebra's
//!   `QR::solve` is only for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve an L2-penalised least squares problem, shrinking toward `prior`
/// (or toward zero when `prior` is `None`).
///
/// The intercept column is penalised like any other; with standardised
/// features and a small `lambda` the bias this introduces is negligible.
pub fn solve_ridge(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    lambda: f64,
    prior: Option<&DVector<f64>>,
) -> Option<DVector<f64>> {
    let (n, p) = x.shape();
    if y.len() != n || prior.is_some_and(|b| b.len() != p) {
        return None;
    }
    if !(lambda.is_finite() && lambda >= 0.0) {
        return None;
    }
    if lambda == 0.0 {
        return solve_least_squares(x, y);
    }

    let penalty = lambda.sqrt();
    let mut xa = DMatrix::<f64>::zeros(n + p, p);
    let mut ya = DVector::<f64>::zeros(n + p);

    xa.rows_mut(0, n).copy_from(x);
    ya.rows_mut(0, n).copy_from(y);
    for j in 0..p {
        xa[(n + j, j)] = penalty;
        ya[n + j] = prior.map_or(0.0, |b| penalty * b[j]);
    }

    solve_least_squares(&xa, &ya)
}
