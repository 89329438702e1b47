//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during solving and fitting
//! - exported to CSV / JSON
//! - reloaded later for comparisons

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Fracture test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestType {
    /// Double cantilever beam (mode I).
    Dcb,
    /// Asymmetric double cantilever beam (mode I).
    Adcb,
    /// End-notched flexure (mode II).
    Enf,
    /// Single-leg bending (mixed mode).
    Slb,
    /// Asymmetric single-leg bending (mixed mode).
    Aslb,
}

impl TestType {
    pub fn display_name(self) -> &'static str {
        match self {
            TestType::Dcb => "DCB",
            TestType::Adcb => "ADCB",
            TestType::Enf => "ENF",
            TestType::Slb => "SLB",
            TestType::Aslb => "ASLB",
        }
    }

    /// Symmetric tests force the lower substrate to the upper thickness.
    pub fn is_symmetric(self) -> bool {
        matches!(self, TestType::Dcb | TestType::Enf | TestType::Slb)
    }
}

/// Functional form fitted to a curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitForm {
    /// `a + b x`
    Linear,
    /// `a + b x + c x^2`
    Quadratic,
    /// `a + b x + c x^2 + d x^3`
    Cubic,
    /// `c + a e^(-b x)`, parameters ordered `[a, b, c]`.
    Exponential,
}

impl FitForm {
    pub fn param_count(self) -> usize {
        match self {
            FitForm::Linear => 2,
            FitForm::Quadratic => 3,
            FitForm::Cubic => 4,
            FitForm::Exponential => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FitForm::Linear => "linear",
            FitForm::Quadratic => "quadratic",
            FitForm::Cubic => "cubic",
            FitForm::Exponential => "exponential",
        }
    }

    pub fn expression(self) -> &'static str {
        match self {
            FitForm::Linear => "y = p0 + p1 x",
            FitForm::Quadratic => "y = p0 + p1 x + p2 x^2",
            FitForm::Cubic => "y = p0 + p1 x + p2 x^2 + p3 x^3",
            FitForm::Exponential => "y = p2 + p0 exp(-p1 x)",
        }
    }
}

/// Goodness-of-fit statistic requested by the caller.
///
/// Downstream pooling depends on the shape of the statistic, so the two are
/// never mixed within one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Mean squared error plus mean/std of the reference data.
    Mse,
    /// `Σ (pred - obs)^2 / obs`
    ChiSquare,
}

/// One sample of a load–displacement response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub displacement: f64,
    pub load: f64,
}

/// Load–displacement response split into elastic and fracture regimes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadDisplacementCurve {
    pub elastic: Vec<CurvePoint>,
    pub fracture: Vec<CurvePoint>,
}

impl LoadDisplacementCurve {
    /// Elastic points followed by fracture points.
    pub fn trace(&self) -> Vec<CurvePoint> {
        self.elastic
            .iter()
            .chain(self.fracture.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elastic.len() + self.fracture.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn peak_load(&self) -> Option<f64> {
        self.trace()
            .iter()
            .map(|p| p.load)
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }
}

/// Mean squared error against a reference, with the reference's mean and
/// population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MseStats {
    pub mse: f64,
    pub mean: f64,
    pub std: f64,
    pub n: usize,
}

/// Fit-quality statistic, tagged by metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "kebab-case")]
pub enum Quality {
    Mse(MseStats),
    ChiSquare { chi2: f64, n: usize },
}

impl Quality {
    pub fn metric(&self) -> Metric {
        match self {
            Quality::Mse(_) => Metric::Mse,
            Quality::ChiSquare { .. } => Metric::ChiSquare,
        }
    }

    /// Number of points the statistic was computed from.
    pub fn n(&self) -> usize {
        match self {
            Quality::Mse(s) => s.n,
            Quality::ChiSquare { n, .. } => *n,
        }
    }

    pub fn as_mse(&self) -> Option<&MseStats> {
        match self {
            Quality::Mse(s) => Some(s),
            Quality::ChiSquare { .. } => None,
        }
    }

    /// The headline error value (MSE or chi-square).
    pub fn error(&self) -> f64 {
        match self {
            Quality::Mse(s) => s.mse,
            Quality::ChiSquare { chi2, .. } => *chi2,
        }
    }
}

/// Output of a single curve fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub form: FitForm,
    pub params: Vec<f64>,
    /// Parameter covariance (row-major, `p x p`). All entries are `inf` when
    /// the system has no residual degrees of freedom; JSON stores them as
    /// `null`.
    #[serde(with = "unbounded_matrix")]
    pub covariance: Vec<Vec<f64>>,
    /// Validity domain: observed `[min x, max x]` of the fitted points.
    pub x_min: f64,
    pub x_max: f64,
    pub iterations: usize,
    pub quality: Quality,
}

/// Matrix entries that JSON cannot represent (`inf`, `NaN`) are written as
/// `null` and read back as `+inf`.
mod unbounded_matrix {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rows: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|row| row.iter().map(|v| v.is_finite().then_some(*v)).collect())
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error> {
        let encoded = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(encoded
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::INFINITY)).collect())
            .collect())
    }
}
