#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization, aggregation, and filtering of BESS fire incident rows.
//!
//! [`Dataset::ingest`] validates a loaded table against the [`Schema`] once
//! and normalizes every row ([`normalize`]). The resulting dataset is
//! immutable and can be shared read-only between dashboard sessions.
//! [`filter`] and [`aggregate`] derive per-session views from it, and
//! [`chart`] counts rows for the bar chart.

pub mod aggregate;
pub mod chart;
pub mod filter;
pub mod normalize;
pub mod parsing;

use std::collections::BTreeSet;

use bess_map_incident_models::{CanonicalRow, CellValue, ColumnKind, RawRow, RawTable, Schema};
use thiserror::Error;

use crate::normalize::normalize_row;

/// Errors raised while ingesting a table. These are fatal at startup.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The table lacks columns the dashboard cannot work without.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Names of the absent columns.
        columns: Vec<String>,
    },
}

/// Validation errors for user-supplied filters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The column is neither declared in the schema nor present in the data.
    #[error("Unknown filter column '{column}'")]
    UnknownColumn {
        /// The requested column.
        column: String,
    },

    /// A numeric column was given a value that is not a number.
    #[error("Invalid numerical filter value '{value}' for column '{column}'")]
    InvalidNumber {
        /// The numeric column.
        column: String,
        /// The rejected value.
        value: String,
    },

    /// The filter value was blank.
    #[error("Empty filter value for column '{column}'")]
    EmptyValue {
        /// The requested column.
        column: String,
    },
}

/// The ingested incident table: a schema plus its canonical rows in source
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<CanonicalRow>,
    extra_columns: BTreeSet<String>,
}

impl Dataset {
    /// Validates `table` against `schema` and normalizes every row.
    ///
    /// Declared columns absent from the table are logged and filled with
    /// defaults. No row is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumns`] if a required column (the
    /// location column) is absent from the table header.
    pub fn ingest(schema: Schema, table: RawTable) -> Result<Self, IngestError> {
        let missing: Vec<String> = schema
            .required_columns()
            .into_iter()
            .filter(|c| !table.columns.iter().any(|h| h.as_str() == *c))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns { columns: missing });
        }

        for column in &schema.columns {
            if !table.columns.contains(&column.name) {
                log::warn!(
                    "Column {:?} not found in data, defaulting every row",
                    column.name
                );
            }
        }

        let rows: Vec<CanonicalRow> = table
            .rows
            .iter()
            .map(|raw| normalize_row(&schema, raw))
            .collect();

        let extra_columns: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.extra.keys().cloned())
            .collect();

        let with_coordinates = rows.iter().filter(|r| r.coordinates.is_some()).count();
        let distinct_keys: BTreeSet<&str> = rows.iter().map(|r| r.location_key.as_str()).collect();
        log::info!(
            "Ingested {} rows ({with_coordinates} with valid lat/lon, {} distinct locations)",
            rows.len(),
            distinct_keys.len()
        );
        if !extra_columns.is_empty() {
            log::debug!("Undeclared columns kept as text: {extra_columns:?}");
        }

        Ok(Self {
            schema,
            rows,
            extra_columns,
        })
    }

    /// Ingests rows that were not loaded from a file, using the union of
    /// their columns as the header.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] under the same conditions as [`Self::ingest`].
    pub fn from_rows(schema: Schema, rows: Vec<RawRow>) -> Result<Self, IngestError> {
        let columns: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.iter().map(|(c, _)| c.to_string()))
            .collect();
        Self::ingest(
            schema,
            RawTable {
                columns: columns.into_iter().collect(),
                rows,
            },
        )
    }

    /// The schema rows were normalized against.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Canonical rows in source order.
    #[must_use]
    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    /// Returns the kind of a column, treating undeclared columns seen in
    /// the data as text.
    #[must_use]
    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.schema.kind_of(column).or_else(|| {
            self.extra_columns
                .contains(column)
                .then_some(ColumnKind::Text)
        })
    }

    /// Unique non-missing values of the source link columns, sorted.
    #[must_use]
    pub fn source_urls(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|row| {
                self.schema
                    .source_urls
                    .iter()
                    .filter_map(|column| match row.cell(column) {
                        Some(CellValue::Text(url)) => Some(url.clone()),
                        _ => None,
                    })
            })
            .collect()
    }
}
