//! Raw row normalization.
//!
//! Turns a [`RawRow`] into a [`CanonicalRow`] against a [`Schema`]. Every
//! row survives: malformed cells degrade to defaults (numeric `0`, text
//! [`CellValue::Missing`], unknown year `None`).

use std::collections::BTreeMap;

use bess_map_incident_models::{
    CanonicalRow, CellValue, ColumnKind, LocationKey, MISSING_TEXT, RawRow, RawValue, Schema,
    YEAR_COLUMN,
};

use crate::parsing::{parse_coordinates_value, parse_number, parse_year_value};

/// Normalizes one raw row.
#[must_use]
pub fn normalize_row(schema: &Schema, raw: &RawRow) -> CanonicalRow {
    let mut fields = BTreeMap::new();
    for column in &schema.columns {
        let value = raw.get(&column.name);
        let cell = match column.kind {
            ColumnKind::Numeric => CellValue::Number(parse_number(value).unwrap_or(0.0)),
            ColumnKind::Text | ColumnKind::Date => text_cell(value),
        };
        fields.insert(column.name.clone(), cell);
    }

    let year = schema
        .date
        .as_deref()
        .and_then(|column| parse_year_value(raw.get(column)));
    if schema.has_year() {
        let cell = year.map_or(CellValue::Missing, |y| CellValue::Number(f64::from(y)));
        fields.insert(YEAR_COLUMN.to_string(), cell);
    }

    let extra = raw
        .iter()
        .filter(|(column, _)| !fields.contains_key(*column))
        .map(|(column, value)| {
            let cell = match value {
                RawValue::Number(n) => CellValue::Number(*n),
                other => text_cell(Some(other)),
            };
            (column.to_string(), cell)
        })
        .collect();

    let location = text_or_placeholder(raw.get(&schema.location));
    let country = text_or_placeholder(raw.get(&schema.country));

    CanonicalRow {
        location_key: LocationKey::normalize(&location),
        location,
        country,
        coordinates: parse_coordinates_value(raw.get(&schema.coordinates)),
        year,
        fields,
        extra,
    }
}

fn text_cell(value: Option<&RawValue>) -> CellValue {
    match value {
        Some(RawValue::Text(s)) if !s.trim().is_empty() => CellValue::Text(s.clone()),
        Some(RawValue::Number(n)) => CellValue::Text(n.to_string()),
        Some(RawValue::Text(_) | RawValue::Missing) | None => CellValue::Missing,
    }
}

fn text_or_placeholder(value: Option<&RawValue>) -> String {
    match text_cell(value) {
        CellValue::Text(s) => s,
        CellValue::Number(_) | CellValue::Missing => MISSING_TEXT.to_string(),
    }
}
