//! Evaluation of the fitted functional forms.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(x)` given parameters (for residuals / evaluation / plots)
//! - fill the parameter gradient `∂y/∂p` at `x` (one Jacobian row)
//!
//! These are implemented here for each form.

use crate::domain::FitForm;

/// Predict `y(x)` for the given form.
///
/// # Panics
/// Panics if `params` is shorter than `form.param_count()`. Callers validate
/// parameter counts before evaluating.
pub fn predict(form: FitForm, x: f64, params: &[f64]) -> f64 {
    match form {
        FitForm::Linear => params[0] + params[1] * x,
        FitForm::Quadratic => params[0] + x * (params[1] + x * params[2]),
        FitForm::Cubic => params[0] + x * (params[1] + x * (params[2] + x * params[3])),
        FitForm::Exponential => params[2] + params[0] * (-params[1] * x).exp(),
    }
}

/// Fill one Jacobian row: `out[j] = ∂y/∂p_j` at `x`.
///
/// # Panics
/// Panics if `out` or `params` is shorter than `form.param_count()`.
pub fn fill_gradient(form: FitForm, x: f64, params: &[f64], out: &mut [f64]) {
    match form {
        FitForm::Linear => {
            out[0] = 1.0;
            out[1] = x;
        }
        FitForm::Quadratic => {
            out[0] = 1.0;
            out[1] = x;
            out[2] = x * x;
        }
        FitForm::Cubic => {
            out[0] = 1.0;
            out[1] = x;
            out[2] = x * x;
            out[3] = x * x * x;
        }
        FitForm::Exponential => {
            let e = (-params[1] * x).exp();
            out[0] = e;
            out[1] = -params[0] * x * e;
            out[2] = 1.0;
        }
    }
}

/// Per-parameter factors mapping parameters fitted on `(x / x_scale,
/// y / y_scale)` back to the unscaled data: `p_j = factor_j * p'_j`.
pub fn param_scales(form: FitForm, x_scale: f64, y_scale: f64) -> Vec<f64> {
    match form {
        FitForm::Exponential => vec![y_scale, 1.0 / x_scale, y_scale],
        FitForm::Linear | FitForm::Quadratic | FitForm::Cubic => (0..form.param_count())
            .map(|power| y_scale / x_scale.powi(power as i32))
            .collect(),
    }
}
