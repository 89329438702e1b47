//! Delimited-table ingest.
//!
//! Turns comma-separated files into `Table`s of optional numeric cells:
//!
//! - **Header row** required; a UTF-8 BOM on the first header is stripped
//! - **Missing cells**: empty, unparsable or non-finite cells become `None`
//! - **History output**: three label rows (region, variable, component)
//!   followed by one row per time sample
//!
//! No numeric processing happens here.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{debug, warn};

use crate::data::Table;
use crate::error::{CzmError, Result};

/// Number of label rows above the samples in a history-output file.
pub const HISTORY_LABEL_ROWS: usize = 3;

/// History-output series: one column per output variable and component.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    /// Region label of each column.
    pub regions: Vec<String>,
    /// Columns named `<variable><component>` (e.g. `RF2`, `U2`).
    pub table: Table,
}

/// Read a header-row CSV file into a `Table`.
pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| CzmError::file(path, e))?;
    let table = parse_table(file)?;
    debug!(
        "read '{}': {} columns x {} rows",
        path.display(),
        table.n_cols(),
        table.n_rows()
    );
    Ok(table)
}

/// Parse header-row CSV data into a `Table`.
pub fn parse_table<R: Read>(reader: R) -> Result<Table> {
    let mut reader = reader_builder().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header_name).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(CzmError::EmptyInput("table has no header row".to_string()));
    }

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        // +2: 1-based lines, after the header
        push_row(&mut columns, &record, idx + 2);
    }

    Table::from_columns(headers, columns)
}

/// Read a history-output CSV file.
pub fn read_history_table(path: &Path) -> Result<HistoryTable> {
    let file = File::open(path).map_err(|e| CzmError::file(path, e))?;
    parse_history_table(file)
}

/// Parse history-output CSV data.
pub fn parse_history_table<R: Read>(reader: R) -> Result<HistoryTable> {
    let mut reader = reader_builder().has_headers(false).from_reader(reader);
    let mut records = reader.records();

    let mut labels: Vec<StringRecord> = Vec::with_capacity(HISTORY_LABEL_ROWS);
    for _ in 0..HISTORY_LABEL_ROWS {
        match records.next() {
            Some(record) => labels.push(record?),
            None => {
                return Err(CzmError::EmptyInput(format!(
                    "history output needs {HISTORY_LABEL_ROWS} label rows, got {}",
                    labels.len()
                )));
            }
        }
    }

    let width = labels.iter().map(StringRecord::len).max().unwrap_or(0);
    let label = |row: usize, col: usize| labels[row].get(col).map(str::trim).unwrap_or("").to_string();

    let regions: Vec<String> = (0..width).map(|c| normalize_header_name(&label(0, c))).collect();
    let headers: Vec<String> = (0..width).map(|c| format!("{}{}", label(1, c), label(2, c))).collect();

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); width];
    for (idx, result) in records.enumerate() {
        let record = result?;
        push_row(&mut columns, &record, idx + HISTORY_LABEL_ROWS + 1);
    }

    Ok(HistoryTable {
        regions,
        table: Table::from_columns(headers, columns)?,
    })
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true).trim(csv::Trim::All);
    builder
}

/// Append one record to the columns, padding short rows with missing cells.
fn push_row(columns: &mut [Vec<Option<f64>>], record: &StringRecord, line: usize) {
    if record.len() > columns.len() {
        warn!(
            "line {line}: {} cells for {} columns, extra cells ignored",
            record.len(),
            columns.len()
        );
    }
    for (col, cells) in columns.iter_mut().enumerate() {
        cells.push(parse_cell(record.get(col)));
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_cell(s: Option<&str>) -> Option<f64> {
    let v = s?.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_and_bad_cells_become_none() {
        let data = "\u{feff}U, RF\n0.0, 1.5\n1.0,\n,abc\n2.0,NaN\n";
        let table = parse_table(data.as_bytes()).unwrap();

        assert_eq!(table.headers(), ["U", "RF"]);
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.column(0).unwrap(), [Some(0.0), Some(1.0), None, Some(2.0)]);
        assert_eq!(table.column(1).unwrap(), [Some(1.5), None, None, None]);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse_table("a,b,c\n1\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(table.column(2).unwrap(), [None, Some(3.0)]);
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(parse_table("".as_bytes()), Err(CzmError::EmptyInput(_))));
    }

    #[test]
    fn history_table_names_columns_by_variable_and_component() {
        let data = "Node ASSEMBLY.1,Node ASSEMBLY.1\nRF,U\n2,2\n0.0,0.0\n12.5,0.1\n20.0,0.2\n";
        let history = parse_history_table(data.as_bytes()).unwrap();

        assert_eq!(history.regions, ["Node ASSEMBLY.1", "Node ASSEMBLY.1"]);
        assert_eq!(history.table.headers(), ["RF2", "U2"]);
        assert_eq!(history.table.column_index("U2"), Some(1));
        assert_eq!(history.table.column(0).unwrap(), [Some(0.0), Some(12.5), Some(20.0)]);
    }

    #[test]
    fn history_table_without_labels_is_empty_input() {
        let err = parse_history_table("region\nRF\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CzmError::EmptyInput(_)));
    }

    #[test]
    fn reads_table_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y\n1,2\n3,4").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.n_cols(), 2);
        assert_eq!(table.column(1).unwrap(), [Some(2.0), Some(4.0)]);
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, CzmError::File { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
