//! Delimited text file source.
//!
//! Reads the first row as headers and every following row as a record
//! keyed by those headers. Empty cells become [`RawValue::Missing`].

use std::path::{Path, PathBuf};

use bess_map_incident_models::{RawRow, RawTable, RawValue};

use crate::{DataSource, SourceError};

/// Source backed by a CSV (or other delimited) file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    /// Path of the file to read.
    path: PathBuf,
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
}

impl CsvFileSource {
    /// Creates a comma-delimited source for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
        }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl DataSource for CsvFileSource {
    fn load(&self) -> Result<RawTable, SourceError> {
        let bytes = std::fs::read(&self.path)?;
        let table = parse_csv(&bytes, self.delimiter)?;
        log::info!(
            "Read {} rows with {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            self.path.display()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

/// Parses delimited bytes into a [`RawTable`].
///
/// # Errors
///
/// Returns [`SourceError`] if the bytes are not valid CSV or have no
/// header row.
pub fn parse_csv(bytes: &[u8], delimiter: u8) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Err(SourceError::Format {
            message: "CSV file contains no header row".to_owned(),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = columns
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(i, header)| {
                let value = record.get(i).map_or(RawValue::Missing, RawValue::from_text);
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}
