//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ (f(x_i; p) - y_i)^2` starting from a caller-supplied guess:
//!
//! - each iteration solves the damped linearized problem (`math::damped_step`)
//! - accepted steps shrink the damping, rejected steps grow it
//! - terminates on small relative cost reduction, small relative step or a
//!   gradient that is small relative to `‖J‖ ‖r‖`
//! - a terminal point whose Jacobian is numerically rank-deficient is
//!   rejected: some parameters no longer affect the model there (e.g. an
//!   exponential term that has decayed to zero)
//!
//! There is no automatic restart: a failure is reported to the caller, who
//! may retry with another form.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitForm;
use crate::error::{CzmError, Result};
use crate::math::damped_step;
use crate::models::{fill_gradient, predict};

/// Iteration budget.
pub const MAX_ITERATIONS: usize = 500;

/// Relative cost reduction below which an accepted step counts as converged.
const FTOL: f64 = 1e-12;
/// Relative step size below which the iterate counts as converged.
const XTOL: f64 = 1e-12;
/// Largest gradient component (`Jᵀr`), relative to `‖J‖ ‖r‖`, at which the
/// iterate counts as converged.
const GTOL: f64 = 1e-12;
/// Smallest accepted ratio of extreme singular values of the final Jacobian.
const RANK_RCOND: f64 = 1e-10;

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e20;

/// Converged least-squares solution.
#[derive(Debug, Clone)]
pub struct Solution {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    /// Jacobian at `params` (n x p).
    pub jacobian: DMatrix<f64>,
    pub iterations: usize,
}

/// Fit `form` to `(xs, ys)` from `initial`.
pub fn levenberg_marquardt(form: FitForm, xs: &[f64], ys: &[f64], initial: &[f64]) -> Result<Solution> {
    let mut params = DVector::from_column_slice(initial);
    let Some(mut residuals) = residual_vector(form, xs, ys, params.as_slice()) else {
        return Err(CzmError::Convergence {
            iterations: 0,
            reason: "non-finite residuals at the initial guess".to_string(),
        });
    };
    let mut cost = residuals.norm_squared();
    let mut lambda = LAMBDA_INIT;

    for iteration in 1..=MAX_ITERATIONS {
        let jac = jacobian(form, xs, params.as_slice());
        let gradient_limit = GTOL * jac.norm() * residuals.norm();
        if cost <= f64::MIN_POSITIVE || jac.tr_mul(&residuals).amax() <= gradient_limit {
            return converged(params, cost, jac, iteration);
        }

        let Some(step) = damped_step(&jac, &residuals, lambda) else {
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(damping_exhausted(iteration));
            }
            continue;
        };

        let step_small = step.norm() <= XTOL * (params.norm() + XTOL);
        let trial = &params + &step;

        match residual_vector(form, xs, ys, trial.as_slice()) {
            Some(r) if r.norm_squared() < cost => {
                let new_cost = r.norm_squared();
                let reduction = (cost - new_cost) / cost;
                params = trial;
                residuals = r;
                cost = new_cost;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if reduction <= FTOL || step_small {
                    let jac = jacobian(form, xs, params.as_slice());
                    return converged(params, cost, jac, iteration);
                }
            }
            _ => {
                if step_small {
                    return converged(params, cost, jac, iteration);
                }
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(damping_exhausted(iteration));
                }
            }
        }
    }

    Err(CzmError::Convergence {
        iterations: MAX_ITERATIONS,
        reason: format!("iteration budget exhausted (sse={cost:.6e})"),
    })
}

/// Residuals `f(x_i; p) - y_i`, or `None` if any is non-finite.
fn residual_vector(form: FitForm, xs: &[f64], ys: &[f64], params: &[f64]) -> Option<DVector<f64>> {
    let r = DVector::from_iterator(
        xs.len(),
        xs.iter().zip(ys).map(|(&x, &y)| predict(form, x, params) - y),
    );
    r.iter().all(|v| v.is_finite()).then_some(r)
}

/// Jacobian of the model with respect to the parameters, one row per `x`.
pub fn jacobian(form: FitForm, xs: &[f64], params: &[f64]) -> DMatrix<f64> {
    let p = params.len();
    let mut jac = DMatrix::<f64>::zeros(xs.len(), p);
    let mut row = vec![0.0; p];
    for (i, &x) in xs.iter().enumerate() {
        fill_gradient(form, x, params, &mut row);
        for j in 0..p {
            jac[(i, j)] = row[j];
        }
    }
    jac
}

fn converged(params: DVector<f64>, sse: f64, jacobian: DMatrix<f64>, iterations: usize) -> Result<Solution> {
    let singular = jacobian.singular_values();
    let ratio = singular.min() / singular.max();
    if !(ratio > RANK_RCOND) {
        return Err(CzmError::Convergence {
            iterations,
            reason: format!(
                "parameters are not identifiable at params={:?} (singular value ratio {ratio:.3e})",
                params.as_slice()
            ),
        });
    }

    Ok(Solution {
        params: params.iter().copied().collect(),
        sse,
        jacobian,
        iterations,
    })
}

fn damping_exhausted(iterations: usize) -> CzmError {
    CzmError::Convergence {
        iterations,
        reason: "no step reduces the residual (damping limit reached)".to_string(),
    }
}
