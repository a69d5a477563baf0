//! Column filters over the ingested dataset.
//!
//! A filter is always evaluated against the full ingested row set, never
//! against a previous filter's output, so applying filters in any order
//! and then resetting lands back on the same rows.

use bess_map_incident_models::{CanonicalRow, CellValue, ColumnKind, FilterSpec, LocationSummary};

use crate::aggregate::aggregate;
use crate::{Dataset, FilterError};

/// Rows surviving a filter plus their re-aggregated summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRows {
    /// Indices into [`Dataset::rows`], in dataset order.
    pub indices: Vec<usize>,
    /// Summaries of the surviving rows.
    pub summaries: Vec<LocationSummary>,
}

impl FilteredRows {
    /// The unfiltered view of a dataset.
    #[must_use]
    pub fn all(dataset: &Dataset) -> Self {
        let indices: Vec<usize> = (0..dataset.rows().len()).collect();
        let summaries = aggregate(dataset.rows(), &dataset.schema().location);
        Self { indices, summaries }
    }
}

/// A filter checked against the schema and ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// Numeric equality.
    Equals { column: String, value: f64 },
    /// Case-insensitive substring match.
    Contains { column: String, needle: String },
}

impl Predicate {
    fn compile(dataset: &Dataset, spec: &FilterSpec) -> Result<Self, FilterError> {
        let kind = dataset
            .column_kind(&spec.column)
            .ok_or_else(|| FilterError::UnknownColumn {
                column: spec.column.clone(),
            })?;

        let query = spec.value.trim();
        if query.is_empty() {
            return Err(FilterError::EmptyValue {
                column: spec.column.clone(),
            });
        }

        match kind {
            ColumnKind::Numeric => {
                let value = query
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| FilterError::InvalidNumber {
                        column: spec.column.clone(),
                        value: spec.value.clone(),
                    })?;
                Ok(Self::Equals {
                    column: spec.column.clone(),
                    value,
                })
            }
            ColumnKind::Text | ColumnKind::Date => Ok(Self::Contains {
                column: spec.column.clone(),
                needle: query.to_lowercase(),
            }),
        }
    }

    fn matches(&self, row: &CanonicalRow) -> bool {
        match self {
            Self::Equals { column, value } => row
                .cell(column)
                .and_then(CellValue::as_number)
                .is_some_and(|n| (n - value).abs() < f64::EPSILON),
            Self::Contains { column, needle } => match row.cell(column) {
                Some(CellValue::Text(s)) => s.to_lowercase().contains(needle.as_str()),
                Some(CellValue::Number(n)) => n.to_string().contains(needle.as_str()),
                Some(CellValue::Missing) | None => false,
            },
        }
    }
}

/// Returns the dataset indices of rows matching `spec`.
///
/// `None` passes every row through.
///
/// # Errors
///
/// Returns [`FilterError`] if the column is unknown, the query is blank,
/// or a numeric column's query does not parse as a number.
pub fn matching_indices(
    dataset: &Dataset,
    spec: Option<&FilterSpec>,
) -> Result<Vec<usize>, FilterError> {
    let Some(spec) = spec else {
        return Ok((0..dataset.rows().len()).collect());
    };

    let predicate = Predicate::compile(dataset, spec)?;
    Ok(dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate.matches(row))
        .map(|(i, _)| i)
        .collect())
}

/// Applies `spec` to the dataset and re-aggregates the surviving rows.
///
/// An empty match set is a valid result with zero summaries.
///
/// # Errors
///
/// Returns [`FilterError`] under the same conditions as
/// [`matching_indices`].
pub fn apply(dataset: &Dataset, spec: Option<&FilterSpec>) -> Result<FilteredRows, FilterError> {
    let indices = matching_indices(dataset, spec)?;
    let summaries = aggregate(
        indices.iter().map(|&i| &dataset.rows()[i]),
        &dataset.schema().location,
    );

    if let Some(spec) = spec {
        log::debug!(
            "Filter {:?} contains {:?}: {} of {} rows, {} locations",
            spec.column,
            spec.value,
            indices.len(),
            dataset.rows().len(),
            summaries.len()
        );
    }

    Ok(FilteredRows { indices, summaries })
}
