//! JSON documents and append-only JSON-lines logs.
//!
//! Configuration files (specimen geometry, FE test model, batch manifest)
//! are single JSON documents. Comparison records and specimen inputs are
//! appended to logs as one compact object per line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CzmError, Result};

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| CzmError::file(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write a pretty-printed JSON document.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| CzmError::file(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out).map_err(|e| CzmError::file(path, e))?;
    out.flush().map_err(|e| CzmError::file(path, e))
}

/// Append `value` as one line, creating the log if needed.
pub fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CzmError::file(path, e))?;
    file.write_all(line.as_bytes()).map_err(|e| CzmError::file(path, e))
}

/// Read every object of a JSON-lines log. Blank lines are skipped.
pub fn read_json_lines(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let file = File::open(path).map_err(|e| CzmError::file(path, e))?;

    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| CzmError::file(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line)? {
            Value::Object(map) => entries.push(map),
            other => {
                return Err(CzmError::InvalidArgument(format!(
                    "'{}': expected one JSON object per line, found {other}",
                    path.display()
                )));
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        name: String,
        mse: f64,
    }

    #[test]
    fn appended_lines_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");

        append_json_line(&path, &Entry { name: "a".into(), mse: 1.5 }).unwrap();
        append_json_line(&path, &Entry { name: "b".into(), mse: 2.0 }).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);

        let entries = read_json_lines(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "a");
        assert_eq!(entries[1]["mse"], json!(2.0));
    }

    #[test]
    fn non_object_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, "{\"a\":1}\n\n[1,2]\n").unwrap();
        assert!(matches!(read_json_lines(&path), Err(CzmError::InvalidArgument(_))));
    }

    #[test]
    fn json_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry.json");
        let entry = Entry { name: "x".into(), mse: 0.25 };
        write_json_pretty(&path, &entry).unwrap();
        assert_eq!(read_json::<Entry>(&path).unwrap(), entry);
    }
}
