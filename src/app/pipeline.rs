//! Shared comparison pipeline used by `compare` and `batch`.
//!
//! One test case:
//! analytical curve -> regime fits -> evaluate fits on simulated /
//! experimental split curves -> pooled comparison record
//!
//! Nothing here prints or appends to logs; the front-end decides what to
//! do with the outputs.

use std::path::{Path, PathBuf};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analytical;
use crate::compare::{ComparisonRecord, Source, SourceComparison};
use crate::data::Table;
use crate::domain::{
    FitForm, FitResult, LoadDisplacementCurve, Metric, MseStats, Quality, SpecimenGeometry, TestModel,
};
use crate::error::{CzmError, Result};
use crate::fit::{evaluate, fit};
use crate::io::{curve_from_table, curve_table, read_json, read_table, ELASTIC_COLUMNS, FRACTURE_COLUMNS};

/// Where the analytical reference comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticalSource {
    /// Previously written curve CSV.
    Curve(PathBuf),
    /// Specimen geometry JSON, solved on the fly.
    Geometry(PathBuf),
    /// FE test-model JSON, converted to a geometry and solved.
    TestModel(PathBuf),
}

impl AnalyticalSource {
    pub fn load(&self) -> Result<LoadDisplacementCurve> {
        match self {
            AnalyticalSource::Curve(path) => curve_from_table(&read_table(path)?),
            AnalyticalSource::Geometry(path) => analytical::solve(&read_json::<SpecimenGeometry>(path)?),
            AnalyticalSource::TestModel(path) => {
                analytical::solve(&read_json::<TestModel>(path)?.to_geometry())
            }
        }
    }

    fn rebased(&self, base: &Path) -> Self {
        match self {
            AnalyticalSource::Curve(p) => AnalyticalSource::Curve(base.join(p)),
            AnalyticalSource::Geometry(p) => AnalyticalSource::Geometry(base.join(p)),
            AnalyticalSource::TestModel(p) => AnalyticalSource::TestModel(base.join(p)),
        }
    }
}

fn default_elastic_form() -> FitForm {
    FitForm::Linear
}

fn default_fracture_form() -> FitForm {
    FitForm::Exponential
}

/// One test case to compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareCase {
    pub name: String,
    pub analytical: AnalyticalSource,
    #[serde(default)]
    pub simulated: Option<PathBuf>,
    #[serde(default)]
    pub experimental: Option<PathBuf>,
    #[serde(default = "default_elastic_form")]
    pub elastic_form: FitForm,
    #[serde(default = "default_fracture_form")]
    pub fracture_form: FitForm,
}

impl CompareCase {
    /// Resolve relative paths against `base`.
    pub fn rebased(&self, base: &Path) -> Self {
        Self {
            analytical: self.analytical.rebased(base),
            simulated: self.simulated.as_ref().map(|p| base.join(p)),
            experimental: self.experimental.as_ref().map(|p| base.join(p)),
            ..self.clone()
        }
    }
}

/// Batch manifest: a list of independent cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub cases: Vec<CompareCase>,
}

/// All computed outputs of one comparison.
#[derive(Debug, Clone)]
pub struct CompareOutput {
    pub record: ComparisonRecord,
    pub analytical: LoadDisplacementCurve,
    pub elastic_fit: FitResult,
    pub fracture_fit: FitResult,
    pub simulated: Option<LoadDisplacementCurve>,
    pub experimental: Option<LoadDisplacementCurve>,
}

/// Run the full comparison for one case.
pub fn run_compare(case: &CompareCase) -> Result<CompareOutput> {
    let analytical = case.analytical.load()?;
    let reference = curve_table(&analytical)?;

    let (ex, ey) = ELASTIC_COLUMNS;
    let (fx, fy) = FRACTURE_COLUMNS;
    let elastic_fit = fit(&reference, ex, ey, case.elastic_form, case.elastic_form.param_count(), Metric::Mse)?;
    let fracture_fit = fit(&reference, fx, fy, case.fracture_form, case.fracture_form.param_count(), Metric::Mse)?;

    let mut record = ComparisonRecord::new(&case.name);
    record.set(
        Source::Analytical,
        SourceComparison::from_regimes(mse_of(&elastic_fit)?, mse_of(&fracture_fit)?)?,
    );

    let mut loaded = [None, None];
    for (slot, (source, path)) in loaded
        .iter_mut()
        .zip([(Source::Simulated, &case.simulated), (Source::Experimental, &case.experimental)])
    {
        let Some(path) = path else { continue };
        let table = read_table(path)?;
        let comparison = compare_against(&table, &elastic_fit, &fracture_fit)?;
        info!(
            "{}: {} pooled MSE {:.4} (elastic {:.4}, fracture {:.4})",
            case.name,
            source.label(),
            comparison.pooled.mse,
            comparison.elastic.mse,
            comparison.fracture.mse
        );
        record.set(source, comparison);
        *slot = Some(curve_from_table(&table)?);
    }
    let [simulated, experimental] = loaded;

    Ok(CompareOutput {
        record,
        analytical,
        elastic_fit,
        fracture_fit,
        simulated,
        experimental,
    })
}

/// Evaluate both regime fits on a split-curve table, each over the
/// source's own displacement range.
pub fn compare_against(table: &Table, elastic: &FitResult, fracture: &FitResult) -> Result<SourceComparison> {
    let elastic_stats = evaluate_regime(table, ELASTIC_COLUMNS, elastic)?;
    let fracture_stats = evaluate_regime(table, FRACTURE_COLUMNS, fracture)?;
    SourceComparison::from_regimes(elastic_stats, fracture_stats)
}

fn evaluate_regime(table: &Table, (x_col, y_col): (usize, usize), model: &FitResult) -> Result<MseStats> {
    let (x_min, x_max) = table.column_range(x_col)?.ok_or_else(|| {
        CzmError::EmptyInput(format!("column '{}' has no values", table.headers()[x_col]))
    })?;
    let quality = evaluate(table, x_col, y_col, x_min, x_max, model.form, &model.params, Metric::Mse)?;
    mse_of_quality(&quality)
}

fn mse_of(fit: &FitResult) -> Result<MseStats> {
    mse_of_quality(&fit.quality)
}

fn mse_of_quality(quality: &Quality) -> Result<MseStats> {
    quality
        .as_mse()
        .copied()
        .ok_or_else(|| CzmError::InvalidArgument("comparison needs MSE statistics".to_string()))
}

/// Run every case of a manifest in parallel. Outputs keep manifest order;
/// failures are returned, not reported.
pub fn run_batch(manifest: &BatchManifest, base: &Path) -> Vec<(String, Result<CompareOutput>)> {
    manifest
        .cases
        .par_iter()
        .map(|case| (case.name.clone(), run_compare(&case.rebased(base))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::specimen::tests::{adcb_geometry, CFRP};
    use crate::domain::{CurvePoint, TestType};
    use crate::io::{write_curve_csv, write_json_pretty};

    fn write_case_files(dir: &Path) -> CompareCase {
        let geometry = adcb_geometry();
        write_json_pretty(&dir.join("geometry.json"), &geometry).unwrap();

        // Simulated trace: the analytical curve with a small offset.
        let analytical = analytical::solve(&geometry).unwrap();
        let shift = |points: &[CurvePoint]| -> Vec<CurvePoint> {
            points
                .iter()
                .map(|p| CurvePoint { displacement: p.displacement, load: p.load + 0.5 })
                .collect()
        };
        let simulated = LoadDisplacementCurve {
            elastic: shift(&analytical.elastic),
            fracture: shift(&analytical.fracture),
        };
        write_curve_csv(&dir.join("sim.csv"), &simulated).unwrap();

        CompareCase {
            name: "adcb".to_string(),
            analytical: AnalyticalSource::Geometry(PathBuf::from("geometry.json")),
            simulated: Some(PathBuf::from("sim.csv")),
            experimental: None,
            elastic_form: FitForm::Linear,
            fracture_form: FitForm::Exponential,
        }
    }

    #[test]
    fn compare_records_analytical_and_simulated_sources() {
        let dir = tempfile::tempdir().unwrap();
        let case = write_case_files(dir.path()).rebased(dir.path());

        let out = run_compare(&case).unwrap();
        let ana = out.record.analytical.unwrap();
        let sim = out.record.simulated.unwrap();
        assert!(out.record.experimental.is_none());

        // Analytical elastic branch is exactly linear.
        assert!(ana.elastic.mse < 1e-12);
        assert_eq!(ana.elastic.n + ana.fracture.n, 40);

        // Boundary points of each regime are excluded.
        assert_eq!(sim.elastic.n, 18);
        assert_eq!(sim.fracture.n, 18);
        assert!((sim.elastic.mse - 0.25).abs() < 1e-6);
        assert!(out.simulated.is_some());
    }

    fn test_model(test_type: TestType, thick_top: f64, thick_bot: f64) -> TestModel {
        TestModel {
            name: format!("{test_type:?}").to_lowercase(),
            test_type,
            len_top: 100.0,
            width: 25.0,
            thick_top,
            thick_bot,
            thick_cz: 0.2,
            crack: 60.0,
            load_e1: 0.0,
            load_e2: 0.0,
            peak_load: 100.0,
            f_tough: 0.42,
            mat_prop_top: CFRP.into(),
        }
    }

    #[test]
    fn compare_fits_bending_families_from_test_models() {
        let dir = tempfile::tempdir().unwrap();
        for model in [
            test_model(TestType::Enf, 2.4, 2.4),
            test_model(TestType::Slb, 2.4, 2.4),
            test_model(TestType::Aslb, 1.5, 5.1),
        ] {
            let path = dir.path().join(format!("{}.json", model.name));
            write_json_pretty(&path, &model).unwrap();
            let case = CompareCase {
                name: model.name.clone(),
                analytical: AnalyticalSource::TestModel(path),
                simulated: None,
                experimental: None,
                elastic_form: FitForm::Linear,
                fracture_form: FitForm::Exponential,
            };

            let out = run_compare(&case).unwrap();
            let ana = out.record.analytical.unwrap();
            assert!(ana.elastic.mse < 1e-12, "{}: {:?}", case.name, ana.elastic);
            assert!(
                ana.fracture.mse < 0.01 * ana.fracture.std.powi(2),
                "{}: fracture {:?}",
                case.name,
                ana.fracture
            );
            assert!(ana.pooled.mse < ana.pooled.std.powi(2), "{}: {:?}", case.name, ana.pooled);
        }
    }

    #[test]
    fn batch_keeps_manifest_order_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_case_files(dir.path());
        let mut missing = good.clone();
        missing.name = "missing".to_string();
        missing.simulated = Some(PathBuf::from("absent.csv"));

        let manifest = BatchManifest {
            cases: vec![good.clone(), missing, good],
        };
        let results = run_batch(&manifest, dir.path());

        let names: Vec<&str> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["adcb", "missing", "adcb"]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(CzmError::File { .. })));
        assert!(results[2].1.is_ok());
    }

    #[test]
    fn manifest_parses_with_default_forms() {
        let manifest: BatchManifest = serde_json::from_str(
            r#"{"cases": [{"name": "t1", "analytical": {"curve": "t1_Analytical.csv"}, "simulated": "t1_Split.csv"}]}"#,
        )
        .unwrap();
        let case = &manifest.cases[0];
        assert_eq!(case.analytical, AnalyticalSource::Curve(PathBuf::from("t1_Analytical.csv")));
        assert_eq!(case.elastic_form, FitForm::Linear);
        assert_eq!(case.fracture_form, FitForm::Exponential);
    }
}
