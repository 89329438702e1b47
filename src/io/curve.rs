//! Read/write split load–displacement curves as CSV.
//!
//! Layout: fixed header `U_elastic,P_elastic,U_fracture,P_fracture`, one
//! row per index; the shorter regime is padded with empty cells. Analytical
//! curves and split traces share this format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::{aligned_pairs, Table};
use crate::domain::{CurvePoint, LoadDisplacementCurve};
use crate::error::{CzmError, Result};
use crate::io::ingest::read_table;

pub const CURVE_HEADERS: [&str; 4] = ["U_elastic", "P_elastic", "U_fracture", "P_fracture"];

/// Column indices of the elastic regime (displacement, load).
pub const ELASTIC_COLUMNS: (usize, usize) = (0, 1);
/// Column indices of the fracture regime (displacement, load).
pub const FRACTURE_COLUMNS: (usize, usize) = (2, 3);

/// Write a curve CSV file.
pub fn write_curve_csv(path: &Path, curve: &LoadDisplacementCurve) -> Result<()> {
    let file = File::create(path).map_err(|e| CzmError::file(path, e))?;
    let mut out = BufWriter::new(file);
    write_curve(&mut out, curve).map_err(|e| CzmError::file(path, e))?;
    out.flush().map_err(|e| CzmError::file(path, e))
}

fn write_curve<W: Write>(out: &mut W, curve: &LoadDisplacementCurve) -> std::io::Result<()> {
    writeln!(out, "{}", CURVE_HEADERS.join(","))?;

    let rows = curve.elastic.len().max(curve.fracture.len());
    for i in 0..rows {
        writeln!(
            out,
            "{},{}",
            point_cells(curve.elastic.get(i)),
            point_cells(curve.fracture.get(i))
        )?;
    }
    Ok(())
}

fn point_cells(point: Option<&CurvePoint>) -> String {
    match point {
        Some(p) => format!("{},{}", p.displacement, p.load),
        None => ",".to_string(),
    }
}

/// Read a curve CSV file.
pub fn read_curve_csv(path: &Path) -> Result<LoadDisplacementCurve> {
    curve_from_table(&read_table(path)?)
}

/// Interpret the first four columns of `table` as a split curve.
pub fn curve_from_table(table: &Table) -> Result<LoadDisplacementCurve> {
    if table.n_cols() < CURVE_HEADERS.len() {
        return Err(CzmError::InvalidArgument(format!(
            "curve table needs {} columns ({}), got {}",
            CURVE_HEADERS.len(),
            CURVE_HEADERS.join(", "),
            table.n_cols()
        )));
    }

    let regime = |(x, y): (usize, usize)| -> Result<Vec<CurvePoint>> {
        Ok(aligned_pairs(table, x, y)?
            .into_iter()
            .map(|(displacement, load)| CurvePoint { displacement, load })
            .collect())
    };

    Ok(LoadDisplacementCurve {
        elastic: regime(ELASTIC_COLUMNS)?,
        fracture: regime(FRACTURE_COLUMNS)?,
    })
}

/// The curve laid out as a four-column table, as written to disk.
pub fn curve_table(curve: &LoadDisplacementCurve) -> Result<Table> {
    let column = |points: &[CurvePoint], f: fn(&CurvePoint) -> f64| -> Vec<Option<f64>> {
        points.iter().map(|p| Some(f(p))).collect()
    };
    let columns = vec![
        column(&curve.elastic, |p| p.displacement),
        column(&curve.elastic, |p| p.load),
        column(&curve.fracture, |p| p.displacement),
        column(&curve.fracture, |p| p.load),
    ];
    let headers = CURVE_HEADERS.iter().map(|h| h.to_string()).collect();
    Table::from_columns(headers, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(displacement: f64, load: f64) -> CurvePoint {
        CurvePoint { displacement, load }
    }

    #[test]
    fn unequal_regimes_are_padded_on_disk() {
        let curve = LoadDisplacementCurve {
            elastic: vec![pt(0.0, 0.0), pt(0.5, 40.0)],
            fracture: vec![pt(1.0, 80.0), pt(1.5, 60.0), pt(2.0, 45.5)],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        write_curve_csv(&path, &curve).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "U_elastic,P_elastic,U_fracture,P_fracture");
        assert_eq!(lines[3], ",,2,45.5");

        assert_eq!(read_curve_csv(&path).unwrap(), curve);
    }

    #[test]
    fn narrow_table_is_rejected() {
        let table = Table::from_points("U", "RF", &[pt(0.0, 1.0)]);
        assert!(matches!(curve_from_table(&table), Err(CzmError::InvalidArgument(_))));
    }

    #[test]
    fn curve_table_uses_fixed_headers() {
        let table = curve_table(&LoadDisplacementCurve {
            elastic: vec![pt(0.0, 0.0)],
            fracture: vec![],
        })
        .unwrap();
        assert_eq!(table.headers(), CURVE_HEADERS);
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.column(2).unwrap(), [None]);
    }
}
