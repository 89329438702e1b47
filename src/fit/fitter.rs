//! Fit a functional form to one table segment and evaluate fitted forms on
//! other data.
//!
//! Given:
//! - a table and the indices of its x / y columns
//! - a functional form and its parameter count
//! - the quality metric the caller wants
//!
//! we:
//! - pair x / y row by row (rows missing both cells are dropped, rows
//!   missing one cell are rejected)
//! - run Levenberg–Marquardt from a vector of ones on the data scaled by its
//!   largest `|x|` and `|y|`, then map the parameters back
//! - report parameters, covariance, validity domain and quality

use log::debug;
use nalgebra::DMatrix;

use crate::data::{aligned_pairs, Table};
use crate::domain::{FitForm, FitResult, Metric, Quality};
use crate::error::{CzmError, Result};
use crate::fit::solver::{jacobian, levenberg_marquardt};
use crate::math::{chi_square, mse_stats};
use crate::models::{param_scales, predict};

/// Fit `form` to columns `x_col` / `y_col` of `table`.
pub fn fit(
    table: &Table,
    x_col: usize,
    y_col: usize,
    form: FitForm,
    param_count: usize,
    metric: Metric,
) -> Result<FitResult> {
    check_param_count(form, param_count)?;
    let pairs = aligned_pairs(table, x_col, y_col)?;
    fit_pairs(&pairs, form, metric)
}

/// Fit `form` to already aligned `(x, y)` pairs.
pub fn fit_pairs(pairs: &[(f64, f64)], form: FitForm, metric: Metric) -> Result<FitResult> {
    let p = form.param_count();
    if pairs.len() < p {
        return Err(CzmError::InsufficientData {
            needed: p,
            got: pairs.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let x_scale = magnitude(&xs);
    let y_scale = magnitude(&ys);
    let us: Vec<f64> = xs.iter().map(|x| x / x_scale).collect();
    let vs: Vec<f64> = ys.iter().map(|y| y / y_scale).collect();
    let scaled = levenberg_marquardt(form, &us, &vs, &vec![1.0; p])?;

    let params: Vec<f64> = param_scales(form, x_scale, y_scale)
        .iter()
        .zip(&scaled.params)
        .map(|(factor, value)| factor * value)
        .collect();
    let predicted: Vec<f64> = xs.iter().map(|&x| predict(form, x, &params)).collect();
    let sse: f64 = predicted.iter().zip(&ys).map(|(fitted, y)| (fitted - y).powi(2)).sum();
    let quality = quality(metric, &ys, &predicted)?;

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    debug!(
        "{} fit on {} points: params={:?}, sse={:.6e}, iterations={}",
        form.display_name(),
        xs.len(),
        params,
        sse,
        scaled.iterations
    );

    Ok(FitResult {
        form,
        covariance: covariance(&jacobian(form, &xs, &params), sse),
        params,
        x_min,
        x_max,
        iterations: scaled.iterations,
        quality,
    })
}

/// Quality of a fitted form on the rows of `table` with `x_min < x < x_max`.
///
/// Boundary points are excluded. An empty filtered set is an error, never a
/// zero error.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    table: &Table,
    x_col: usize,
    y_col: usize,
    x_min: f64,
    x_max: f64,
    form: FitForm,
    params: &[f64],
    metric: Metric,
) -> Result<Quality> {
    check_param_count(form, params.len())?;
    let pairs = aligned_pairs(table, x_col, y_col)?;
    evaluate_pairs(&pairs, x_min, x_max, form, params, metric)
}

/// `evaluate` on already aligned `(x, y)` pairs.
pub fn evaluate_pairs(
    pairs: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    form: FitForm,
    params: &[f64],
    metric: Metric,
) -> Result<Quality> {
    check_param_count(form, params.len())?;
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs
        .iter()
        .copied()
        .filter(|&(x, _)| x_min < x && x < x_max)
        .unzip();

    if xs.is_empty() {
        return Err(CzmError::InsufficientData { needed: 1, got: 0 });
    }

    let predicted: Vec<f64> = xs.iter().map(|&x| predict(form, x, params)).collect();
    quality(metric, &ys, &predicted)
}

/// Compute the requested statistic.
pub fn quality(metric: Metric, observed: &[f64], predicted: &[f64]) -> Result<Quality> {
    match metric {
        Metric::Mse => Ok(Quality::Mse(mse_stats(observed, predicted)?)),
        Metric::ChiSquare => Ok(Quality::ChiSquare {
            chi2: chi_square(observed, predicted)?,
            n: observed.len(),
        }),
    }
}

fn check_param_count(form: FitForm, param_count: usize) -> Result<()> {
    if param_count != form.param_count() {
        return Err(CzmError::InvalidArgument(format!(
            "{} form takes {} parameters, got {param_count}",
            form.display_name(),
            form.param_count()
        )));
    }
    Ok(())
}

/// Largest magnitude in `values`, or 1 when that is zero.
fn magnitude(values: &[f64]) -> f64 {
    let m = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if m.is_finite() && m > 0.0 { m } else { 1.0 }
}

/// `pinv(JᵀJ) · SSE / (n - p)`, or all `inf` without residual degrees of freedom.
fn covariance(jac: &DMatrix<f64>, sse: f64) -> Vec<Vec<f64>> {
    let (n, p) = jac.shape();
    if n <= p {
        return vec![vec![f64::INFINITY; p]; p];
    }

    let svd = jac.clone().svd(false, true);
    let Some(v_t) = svd.v_t else {
        return vec![vec![f64::INFINITY; p]; p];
    };

    let s_max = svd.singular_values.max();
    let threshold = f64::EPSILON * n.max(p) as f64 * s_max;
    let mut cov = DMatrix::<f64>::zeros(p, p);
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s > threshold {
            let row = v_t.row(k);
            cov += row.transpose() * row / (s * s);
        }
    }
    cov *= sse / (n - p) as f64;

    (0..p).map(|i| (0..p).map(|j| cov[(i, j)]).collect()).collect()
}
