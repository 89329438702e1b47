//! In-memory numeric table with missing cells.
//!
//! Columns may be ragged on construction (e.g. an elastic regime shorter
//! than the fracture regime); short columns are padded with missing cells so
//! every column has `n_rows()` entries.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::domain::CurvePoint;
use crate::error::{CzmError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Build a table from named columns, padding short columns.
    pub fn from_columns(headers: Vec<String>, mut columns: Vec<Vec<Option<f64>>>) -> Result<Self> {
        if headers.len() != columns.len() {
            return Err(CzmError::InvalidArgument(format!(
                "{} headers for {} columns",
                headers.len(),
                columns.len()
            )));
        }
        let n_rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        for col in &mut columns {
            col.resize(n_rows, None);
        }
        Ok(Self { headers, columns })
    }

    /// Two-column table (`x`, `y`) from curve points.
    pub fn from_points(x_header: &str, y_header: &str, points: &[CurvePoint]) -> Self {
        Self {
            headers: vec![x_header.to_string(), y_header.to_string()],
            columns: vec![
                points.iter().map(|p| Some(p.displacement)).collect(),
                points.iter().map(|p| Some(p.load)).collect(),
            ],
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn column(&self, index: usize) -> Result<&[Option<f64>]> {
        self.columns
            .get(index)
            .map(Vec::as_slice)
            .ok_or(CzmError::ColumnOutOfRange {
                index,
                width: self.columns.len(),
            })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Min / max of the present values of a column.
    pub fn column_range(&self, index: usize) -> Result<Option<(f64, f64)>> {
        let range = self.column(index)?.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        });
        Ok(range)
    }
}

/// A column selected by zero-based index or by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    pub fn resolve(&self, table: &Table) -> Result<usize> {
        match self {
            ColumnRef::Index(index) => table.column(*index).map(|_| *index),
            ColumnRef::Name(name) => table.column_index(name).ok_or_else(|| {
                CzmError::InvalidArgument(format!(
                    "no column named '{name}' (have: {})",
                    table.headers().join(", ")
                ))
            }),
        }
    }
}

/// Digits select by index, anything else by name.
impl FromStr for ColumnRef {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "{index}"),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

/// Pair the cells of two columns row by row.
///
/// Rows where both cells are missing are skipped. A row with exactly one
/// missing cell is rejected: the caller must align columns first.
pub fn aligned_pairs(table: &Table, x_col: usize, y_col: usize) -> Result<Vec<(f64, f64)>> {
    let xs = table.column(x_col)?;
    let ys = table.column(y_col)?;

    let mut out = Vec::with_capacity(xs.len());
    for (row, (x, y)) in xs.iter().zip(ys.iter()).enumerate() {
        match (x, y) {
            (Some(x), Some(y)) => out.push((*x, *y)),
            (None, None) => {}
            _ => return Err(CzmError::MisalignedColumns { row }),
        }
    }
    Ok(out)
}
