//! JSON record file source.
//!
//! Reads a top-level array of flat objects. Strings and numbers map to
//! text and numeric cells; `null`, empty strings, and nested values are
//! treated as missing. The header is the union of keys in first-seen order.

use std::path::{Path, PathBuf};

use bess_map_incident_models::{RawRow, RawTable, RawValue};

use crate::{DataSource, SourceError};

/// Source backed by a JSON file holding an array of records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl DataSource for JsonFileSource {
    fn load(&self) -> Result<RawTable, SourceError> {
        let text = std::fs::read_to_string(&self.path)?;
        let body: serde_json::Value = serde_json::from_str(&text)?;
        let table = parse_records(&body)?;
        log::info!(
            "Read {} records from {}",
            table.rows.len(),
            self.path.display()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("JSON file {}", self.path.display())
    }
}

/// Converts a JSON array of objects into a [`RawTable`].
///
/// # Errors
///
/// Returns [`SourceError::Format`] if the value is not an array of objects.
pub fn parse_records(body: &serde_json::Value) -> Result<RawTable, SourceError> {
    let records = body.as_array().ok_or_else(|| SourceError::Format {
        message: "JSON incident file is not an array".to_string(),
    })?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| SourceError::Format {
            message: format!("Record {i} is not an object"),
        })?;

        let mut row = RawRow::new();
        for (key, value) in object {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            let cell = match value {
                serde_json::Value::String(s) => RawValue::from_text(s),
                serde_json::Value::Number(n) => n.as_f64().map_or(RawValue::Missing, RawValue::Number),
                serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
                serde_json::Value::Null
                | serde_json::Value::Array(_)
                | serde_json::Value::Object(_) => RawValue::Missing,
            };
            row.insert(key, cell);
        }
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}
