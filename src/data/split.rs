//! Split a load–displacement trace at peak load.
//!
//! Rows before the first occurrence of the maximum load form the elastic
//! regime; the peak row and everything after it form the fracture regime.
//! The cut is index-aligned: nothing is interpolated at the boundary.

use log::debug;

use crate::data::Table;
use crate::domain::{CurvePoint, LoadDisplacementCurve};
use crate::error::{CzmError, Result};

/// Elastic / fracture regimes of one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeSplit {
    pub elastic: Vec<CurvePoint>,
    pub fracture: Vec<CurvePoint>,
    /// Row index of the peak load in the source table.
    pub peak_row: usize,
}

impl RegimeSplit {
    pub fn into_curve(self) -> LoadDisplacementCurve {
        LoadDisplacementCurve {
            elastic: self.elastic,
            fracture: self.fracture,
        }
    }
}

/// Split `table` at the maximum of `load_col`.
///
/// Rows with a missing displacement or load are left out of the regimes.
pub fn split_at_max(table: &Table, disp_col: usize, load_col: usize) -> Result<RegimeSplit> {
    let disp = table.column(disp_col)?;
    let load = table.column(load_col)?;
    split_rows(disp, load)
}

/// Split an ordered trace of points at its maximum load.
pub fn split_trace(points: &[CurvePoint]) -> Result<RegimeSplit> {
    let disp: Vec<Option<f64>> = points.iter().map(|p| Some(p.displacement)).collect();
    let load: Vec<Option<f64>> = points.iter().map(|p| Some(p.load)).collect();
    split_rows(&disp, &load)
}

fn split_rows(disp: &[Option<f64>], load: &[Option<f64>]) -> Result<RegimeSplit> {
    if load.is_empty() {
        return Err(CzmError::EmptyInput("load–displacement table has no rows".to_string()));
    }

    let mut peak: Option<(usize, f64)> = None;
    for (row, value) in load.iter().enumerate() {
        if let Some(v) = *value {
            if peak.is_none_or(|(_, best)| v > best) {
                peak = Some((row, v));
            }
        }
    }
    let Some((peak_row, peak_load)) = peak else {
        return Err(CzmError::EmptyInput("load column has no values".to_string()));
    };

    let collect = |range: std::ops::Range<usize>| -> Vec<CurvePoint> {
        range
            .filter_map(|row| match (disp[row], load[row]) {
                (Some(displacement), Some(load)) => Some(CurvePoint { displacement, load }),
                _ => None,
            })
            .collect()
    };

    let elastic = collect(0..peak_row);
    let fracture = collect(peak_row..load.len());
    debug!(
        "split at row {peak_row} (peak load {peak_load:.4}): {} elastic / {} fracture points",
        elastic.len(),
        fracture.len()
    );

    Ok(RegimeSplit {
        elastic,
        fracture,
        peak_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::{solve, SAMPLE_POINTS};
    use crate::domain::specimen::tests::adcb_geometry;

    fn headers() -> Vec<String> {
        vec!["RF2".to_string(), "U2".to_string()]
    }

    #[test]
    fn splits_at_first_maximum() {
        let table = Table::from_columns(
            headers(),
            vec![
                vec![Some(0.0), Some(5.0), Some(9.0), Some(9.0), Some(4.0)],
                vec![Some(0.0), Some(0.1), Some(0.2), Some(0.3), Some(0.4)],
            ],
        )
        .unwrap();

        let split = split_at_max(&table, 1, 0).unwrap();
        assert_eq!(split.peak_row, 2);
        assert_eq!(split.elastic.len(), 2);
        assert_eq!(split.fracture.len(), 3);
        assert_eq!(split.fracture[0], CurvePoint { displacement: 0.2, load: 9.0 });
    }

    #[test]
    fn empty_table_is_rejected() {
        let table = Table::from_columns(headers(), vec![vec![], vec![]]).unwrap();
        assert!(matches!(split_at_max(&table, 1, 0), Err(CzmError::EmptyInput(_))));
    }

    #[test]
    fn single_row_gives_empty_elastic_and_singleton_fracture() {
        let table = Table::from_columns(headers(), vec![vec![Some(3.0)], vec![Some(0.5)]]).unwrap();
        let split = split_at_max(&table, 1, 0).unwrap();
        assert!(split.elastic.is_empty());
        assert_eq!(split.fracture.len(), 1);
    }

    #[test]
    fn synthetic_curve_splits_back_into_its_branches() {
        let curve = solve(&adcb_geometry()).unwrap();
        // Fracture branch starts above the maximum elastic load and decreases.
        assert!(curve.fracture[0].load > curve.elastic.last().unwrap().load);

        let split = split_trace(&curve.trace()).unwrap();
        assert_eq!(split.elastic.len(), SAMPLE_POINTS);
        assert_eq!(split.fracture.len(), SAMPLE_POINTS);
        assert_eq!(split.into_curve(), curve);
    }

    #[test]
    fn bad_column_index_is_reported() {
        let table = Table::from_columns(headers(), vec![vec![Some(1.0)], vec![Some(1.0)]]).unwrap();
        assert!(matches!(split_at_max(&table, 5, 0), Err(CzmError::ColumnOutOfRange { .. })));
    }
}
