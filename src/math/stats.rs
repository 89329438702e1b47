//! Goodness-of-fit statistics between observed and predicted values.

use crate::domain::MseStats;
use crate::error::{CzmError, Result};

/// Mean squared error of `predicted` against `observed`, plus the mean and
/// population standard deviation of `observed`.
pub fn mse_stats(observed: &[f64], predicted: &[f64]) -> Result<MseStats> {
    let n = check_lengths(observed, predicted)?;
    let nf = n as f64;

    let mse = observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| (p - o).powi(2))
        .sum::<f64>()
        / nf;
    let mean = observed.iter().sum::<f64>() / nf;
    let std = (observed.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / nf).sqrt();

    Ok(MseStats { mse, mean, std, n })
}

/// `Σ (pred - obs)^2 / obs`
///
/// Undefined when an observation is zero.
pub fn chi_square(observed: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(observed, predicted)?;

    let mut chi2 = 0.0;
    for (o, p) in observed.iter().zip(predicted) {
        if *o == 0.0 {
            return Err(CzmError::Domain(
                "chi-square is undefined for a zero observation".to_string(),
            ));
        }
        chi2 += (p - o).powi(2) / o;
    }
    Ok(chi2)
}

fn check_lengths(observed: &[f64], predicted: &[f64]) -> Result<usize> {
    if observed.len() != predicted.len() {
        return Err(CzmError::InvalidArgument(format!(
            "{} observations for {} predictions",
            observed.len(),
            predicted.len()
        )));
    }
    if observed.is_empty() {
        return Err(CzmError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(observed.len())
}
