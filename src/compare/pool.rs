//! Pooled statistics across the elastic and fracture regimes.

use serde::{Deserialize, Serialize};

use crate::domain::MseStats;
use crate::error::{CzmError, Result};

/// Regime statistics pooled into one figure per quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PooledStats {
    pub mse: f64,
    pub mean: f64,
    pub std: f64,
    /// Combined sample size.
    pub n: usize,
}

/// Sample-size weighted mean of two group means.
pub fn pooled_mean(m1: f64, m2: f64, n1: usize, n2: usize) -> Result<f64> {
    let total = n1 + n2;
    if total == 0 {
        return Err(CzmError::InsufficientData { needed: 1, got: 0 });
    }
    Ok((n1 as f64 * m1 + n2 as f64 * m2) / total as f64)
}

/// Standard deviation of the union of two groups, from their means,
/// standard deviations and sizes.
pub fn pooled_std(m1: f64, m2: f64, s1: f64, s2: f64, n1: usize, n2: usize) -> Result<f64> {
    let total = n1 + n2;
    if total <= 1 {
        return Err(CzmError::InsufficientData { needed: 2, got: total });
    }
    let (n1, n2, nt) = (n1 as f64, n2 as f64, total as f64);
    let within = (n1 - 1.0) * s1 * s1 + (n2 - 1.0) * s2 * s2;
    let between = n1 * n2 * (m1 - m2).powi(2) / nt;
    Ok(((within + between) / (nt - 1.0)).sqrt())
}

/// Pool elastic and fracture statistics, each weighted by its own point count.
pub fn combine(elastic: &MseStats, fracture: &MseStats) -> Result<PooledStats> {
    let (n1, n2) = (elastic.n, fracture.n);
    Ok(PooledStats {
        mse: pooled_mean(elastic.mse, fracture.mse, n1, n2)?,
        mean: pooled_mean(elastic.mean, fracture.mean, n1, n2)?,
        std: pooled_std(elastic.mean, fracture.mean, elastic.std, fracture.std, n1, n2)?,
        n: n1 + n2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mse: f64, mean: f64, std: f64, n: usize) -> MseStats {
        MseStats { mse, mean, std, n }
    }

    #[test]
    fn pooled_mean_of_equal_means_is_that_mean() {
        for (n1, n2) in [(1, 1), (3, 17), (20, 0), (0, 5)] {
            let m = pooled_mean(4.25, 4.25, n1, n2).unwrap();
            assert!((m - 4.25).abs() < 1e-12);
        }
    }

    #[test]
    fn pooled_std_of_identical_groups_tends_to_the_common_std() {
        let s = 0.7;
        let mut prev_gap = f64::INFINITY;
        for n in [2, 10, 100, 10_000] {
            let pooled = pooled_std(3.0, 3.0, s, s, n, n).unwrap();
            let exact = s * ((2.0 * n as f64 - 2.0) / (2.0 * n as f64 - 1.0)).sqrt();
            assert!((pooled - exact).abs() < 1e-12);
            let gap = (pooled - s).abs();
            assert!(gap < prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-4);
    }

    #[test]
    fn pooled_std_equals_sample_std_of_the_union() {
        // [1, 3]: mean 2, sample std sqrt(2). [5, 7, 9]: mean 7, sample std 2.
        let s = pooled_std(2.0, 7.0, 2.0f64.sqrt(), 2.0, 2, 3).unwrap();
        // [1, 3, 5, 7, 9]: sample variance 10.
        assert!((s - 10.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_groups_are_insufficient() {
        assert!(matches!(pooled_mean(1.0, 2.0, 0, 0), Err(CzmError::InsufficientData { .. })));
        assert!(matches!(
            pooled_std(1.0, 2.0, 0.1, 0.1, 1, 0),
            Err(CzmError::InsufficientData { .. })
        ));
    }

    #[test]
    fn combine_weights_by_regime_counts() {
        let pooled = combine(&stats(1.0, 10.0, 0.0, 1), &stats(4.0, 10.0, 0.0, 3)).unwrap();
        assert!((pooled.mse - 3.25).abs() < 1e-12);
        assert!((pooled.mean - 10.0).abs() < 1e-12);
        assert_eq!(pooled.std, 0.0);
        assert_eq!(pooled.n, 4);
    }
}
