//! Formatted terminal output.
//!
//! Formatting lives here so the numeric code stays free of presentation
//! and output changes stay localized (golden tests below).

use serde_json::{Map, Value};

use crate::compare::ComparisonRecord;
use crate::domain::{FitResult, LoadDisplacementCurve, MseStats, Quality};

/// Header plus per-regime counts and ranges of a split curve.
pub fn format_curve_summary(title: &str, curve: &LoadDisplacementCurve) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {title} ===\n"));
    out.push_str(&format!(
        "Points: n={} (elastic {}, fracture {})\n",
        curve.len(),
        curve.elastic.len(),
        curve.fracture.len()
    ));
    if let Some(peak) = curve.peak_load() {
        out.push_str(&format!("Peak load: {peak:.3}\n"));
    }
    for (label, points) in [("elastic", &curve.elastic), ("fracture", &curve.fracture)] {
        let Some((u_min, u_max)) = span(points.iter().map(|p| p.displacement)) else {
            out.push_str(&format!("{label:<9} (empty)\n"));
            continue;
        };
        let (p_min, p_max) = span(points.iter().map(|p| p.load)).unwrap_or((f64::NAN, f64::NAN));
        out.push_str(&format!(
            "{label:<9} U=[{u_min:.4}, {u_max:.4}] P=[{p_min:.3}, {p_max:.3}]\n"
        ));
    }
    out
}

/// Fitted form, parameters with standard errors, domain and quality.
pub fn format_fit_summary(label: &str, fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{label}: {} fit  {}\n",
        fit.form.display_name(),
        fit.form.expression()
    ));
    out.push_str(&format!("- params : {}\n", fmt_vec(&fit.params)));

    let std_errors: Vec<f64> = (0..fit.params.len())
        .map(|i| fit.covariance.get(i).and_then(|row| row.get(i)).map_or(f64::NAN, |v| v.sqrt()))
        .collect();
    out.push_str(&format!("- stderr : {}\n", fmt_vec(&std_errors)));
    out.push_str(&format!("- domain : [{:.4}, {:.4}]\n", fit.x_min, fit.x_max));
    out.push_str(&format!("- quality: {}\n", fmt_quality(&fit.quality)));
    out.push_str(&format!("- iterations: {}\n", fit.iterations));
    out
}

pub fn fmt_quality(quality: &Quality) -> String {
    match quality {
        Quality::Mse(s) => fmt_mse(s),
        Quality::ChiSquare { chi2, n } => format!("chi2={chi2:.4} n={n}"),
    }
}

fn fmt_mse(s: &MseStats) -> String {
    format!("MSE={:.4} mean={:.3} std={:.3} n={}", s.mse, s.mean, s.std, s.n)
}

/// Per-source regime and pooled statistics of a comparison record.
pub fn format_comparison(record: &ComparisonRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Comparison: {}\n", record.name));
    out.push_str(
        format!(
            "{:<13} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "source", "mse_elastic", "mse_fracture", "mse_pooled", "mean", "std"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<13} {:-<12} {:-<12} {:-<12} {:-<10} {:-<10}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (source, c) in record.sources() {
        out.push_str(&format!(
            "{:<13} {:>12.4} {:>12.4} {:>12.4} {:>10.3} {:>10.3}\n",
            source.label(),
            c.elastic.mse,
            c.fracture.mse,
            c.pooled.mse,
            c.pooled.mean,
            c.pooled.std
        ));
    }
    out
}

/// One line per logged comparison: name, time and pooled MSE per source.
pub fn format_history(entries: &[Map<String, Value>]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:<25} {:>12} {:>12} {:>12}\n",
            "name", "recorded_at", "exp_mse", "sim_mse", "ana_mse"
        )
        .trim_end(),
    );
    out.push('\n');

    for entry in entries {
        let text = |key: &str| entry.get(key).and_then(Value::as_str).unwrap_or("");
        let number = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_f64)
                .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
        };
        out.push_str(
            format!(
                "{:<20} {:<25} {:>12} {:>12} {:>12}\n",
                truncate(text("name"), 20),
                truncate(text("recorded_at"), 25),
                number("exp_mse"),
                number("sim_mse"),
                number("ana_mse")
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    })
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Source, SourceComparison};
    use crate::domain::{CurvePoint, FitForm};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn comparison_table_golden() {
        let mut record = ComparisonRecord::at("DCB_1", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        record.set(
            Source::Simulated,
            SourceComparison::from_regimes(
                MseStats { mse: 1.0, mean: 50.0, std: 0.0, n: 2 },
                MseStats { mse: 3.0, mean: 50.0, std: 0.0, n: 2 },
            )
            .unwrap(),
        );

        let expected = concat!(
            "Comparison: DCB_1\n",
            "source         mse_elastic mse_fracture   mse_pooled       mean        std\n",
            "------------- ------------ ------------ ------------ ---------- ----------\n",
            "simulated           1.0000       3.0000       2.0000     50.000      0.000\n",
        );
        assert_eq!(format_comparison(&record), expected);
    }

    #[test]
    fn fit_summary_reports_standard_errors() {
        let fit = FitResult {
            form: FitForm::Linear,
            params: vec![2.0, 3.0],
            covariance: vec![vec![0.04, 0.0], vec![0.0, f64::INFINITY]],
            x_min: 0.0,
            x_max: 3.0,
            iterations: 4,
            quality: Quality::ChiSquare { chi2: 0.5, n: 4 },
        };
        let txt = format_fit_summary("elastic", &fit);
        assert!(txt.starts_with("elastic: linear fit"));
        assert!(txt.contains("- stderr : [0.200000, inf]"));
        assert!(txt.contains("- quality: chi2=0.5000 n=4"));
    }

    #[test]
    fn curve_summary_handles_empty_regime() {
        let curve = LoadDisplacementCurve {
            elastic: vec![],
            fracture: vec![CurvePoint { displacement: 1.0, load: 9.0 }],
        };
        let txt = format_curve_summary("split", &curve);
        assert!(txt.contains("elastic   (empty)"));
        assert!(txt.contains("Peak load: 9.000"));
    }

    #[test]
    fn history_marks_missing_sources() {
        let entry = json!({"name": "t1", "recorded_at": "2024-01-01T00:00:00+00:00", "sim_mse": 1.5});
        let Value::Object(map) = entry else { unreachable!() };
        let txt = format_history(&[map]);
        let row = txt.lines().nth(1).unwrap();
        assert!(row.starts_with("t1"));
        assert!(row.contains("1.5000"));
        assert_eq!(row.matches(" -").count(), 2);
    }
}
