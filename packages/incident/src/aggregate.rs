//! Grouping of canonical rows into per-location summaries.

use std::collections::BTreeMap;

use bess_map_incident_models::{CanonicalRow, LocationKey, LocationSummary};

/// Groups rows by [`LocationKey`].
///
/// Summaries come out in first-encounter order of their key. Coordinates
/// come from the first member row that has them; display name and country
/// from the first member row. `incident_count` is the member row count, so
/// the counts always sum to the number of input rows. Keys with no member
/// rows are never emitted, and an empty input yields no summaries.
///
/// `aggregated_fields` collects every column except `location_column`.
#[must_use]
pub fn aggregate<'a>(
    rows: impl IntoIterator<Item = &'a CanonicalRow>,
    location_column: &str,
) -> Vec<LocationSummary> {
    let mut summaries: Vec<LocationSummary> = Vec::new();
    let mut positions: BTreeMap<LocationKey, usize> = BTreeMap::new();

    for row in rows {
        let idx = *positions
            .entry(row.location_key.clone())
            .or_insert_with(|| {
                summaries.push(LocationSummary {
                    location_key: row.location_key.clone(),
                    display_name: row.location.clone(),
                    coordinates: None,
                    country: row.country.clone(),
                    incident_count: 0,
                    aggregated_fields: BTreeMap::new(),
                });
                summaries.len() - 1
            });

        let summary = &mut summaries[idx];
        summary.incident_count += 1;
        if summary.coordinates.is_none() {
            summary.coordinates = row.coordinates;
        }

        for (column, value) in row.fields.iter().chain(row.extra.iter()) {
            if column == location_column {
                continue;
            }
            summary
                .aggregated_fields
                .entry(column.clone())
                .or_default()
                .push(value.clone());
        }
    }

    log::trace!("Aggregated rows into {} location summaries", summaries.len());

    summaries
}
