//! Linear least squares through the SVD.
//!
//! Each Levenberg–Marquardt iteration solves a small damped problem:
//!
//! ```text
//! minimize ‖J δ + r‖² + λ Σ d_j δ_j²,   d_j = ‖J e_j‖²
//! ```
//!
//! posed as ordinary least squares on the augmented system
//! `[J; sqrt(λ D)] δ = [-r; 0]`.
//!
//! The parameter dimension is 2–4, so a full SVD per step is cheap and keeps
//! rank-deficient Jacobians (flat exponential tails) solvable.

use nalgebra::{DMatrix, DVector};

/// Singular values below `RCOND * σ_max` are treated as zero.
const RCOND: f64 = 1e-12;

/// Minimum-norm solution of `a x ≈ b`.
///
/// Returns `None` for a degenerate system (shape mismatch, all-zero or
/// non-finite matrix) or a non-finite solution.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() != b.len() || a.ncols() == 0 {
        return None;
    }

    let svd = a.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }

    svd.solve(b, RCOND * s_max)
        .ok()
        .filter(|x| x.iter().all(|v| v.is_finite()))
}

/// Levenberg–Marquardt step `δ` for Jacobian `jac`, residuals `r` and
/// damping `lambda`, with Marquardt column scaling.
pub fn damped_step(jac: &DMatrix<f64>, residuals: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let (n, p) = jac.shape();

    let mut augmented = DMatrix::<f64>::zeros(n + p, p);
    augmented.rows_mut(0, n).copy_from(jac);
    for j in 0..p {
        let scale = jac.column(j).norm_squared().max(f64::MIN_POSITIVE);
        augmented[(n + j, j)] = (lambda * scale).sqrt();
    }

    let mut rhs = DVector::<f64>::zeros(n + p);
    rhs.rows_mut(0, n).copy_from(&(-residuals));

    solve_least_squares(&augmented, &rhs)
}
