//! Bar chart counts over the current row set.

use std::collections::BTreeMap;

use bess_map_incident_models::{CanonicalRow, CellValue, ChartBar, ChartData};

/// Counts rows grouped by the value of `column`, one bar per distinct value
/// sorted by label.
///
/// Rows whose value is missing in a numeric sense (an unknown year) are left
/// out. Missing text values are counted under the `-` placeholder.
#[must_use]
pub fn chart_counts<'a>(
    rows: impl IntoIterator<Item = &'a CanonicalRow>,
    column: &str,
    numeric: bool,
) -> ChartData {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let label = match row.cell(column) {
            Some(CellValue::Missing) if numeric => continue,
            Some(cell) => cell.to_string(),
            None => continue,
        };
        *counts.entry(label).or_default() += 1;
    }

    let bars: Vec<ChartBar> = counts
        .into_iter()
        .map(|(label, count)| ChartBar { label, count })
        .collect();

    let title = if bars.is_empty() {
        "No data to plot".to_string()
    } else {
        format!("Number of Incidents by {column}")
    };

    ChartData {
        column: column.to_string(),
        title,
        bars,
    }
}
