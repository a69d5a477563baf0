#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident table data sources.
//!
//! Provides the [`DataSource`] trait and implementations for delimited text
//! files ([`csv_file`]) and JSON record arrays ([`json_file`]). Sources only
//! read cells; typing and defaulting happen during ingestion in
//! `bess_map_incident`.

pub mod csv_file;
pub mod json_file;

use std::path::Path;

use bess_map_incident_models::RawTable;

/// Errors that can occur while reading an incident table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but does not have the expected shape.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },
}

/// A provider of incident rows.
pub trait DataSource {
    /// Reads the whole table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read or parsed.
    fn load(&self) -> Result<RawTable, SourceError>;

    /// Human-readable description for log messages.
    fn describe(&self) -> String;
}

/// Picks a source implementation from the file extension: `.json` files
/// are read as JSON records, `.tsv` as tab-delimited, anything else as CSV.
#[must_use]
pub fn for_path(path: &Path) -> Box<dyn DataSource + Send + Sync> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            Box::new(json_file::JsonFileSource::new(path))
        }
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => {
            Box::new(csv_file::CsvFileSource::new(path).with_delimiter(b'\t'))
        }
        _ => Box::new(csv_file::CsvFileSource::new(path)),
    }
}
