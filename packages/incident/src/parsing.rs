//! Cell parsing helpers shared by the normalizer and the filter engine.
//!
//! Nothing here returns an error: malformed input degrades to `None` and
//! the caller picks the default.

use bess_map_incident_models::{Coordinates, RawValue};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};

/// Date-only formats tried in order when deriving the incident year.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Date-time formats tried in order when deriving the incident year.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses `"<lat>, <lon>"` text into validated coordinates.
///
/// Returns `None` unless the text splits on exactly one `,` into two
/// float substrings with latitude in `[-90, 90]` and longitude in
/// `[-180, 180]`.
#[must_use]
pub fn parse_coordinates(text: &str) -> Option<Coordinates> {
    let (lat, lon) = text.split_once(',')?;
    if lon.contains(',') {
        return None;
    }
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lon.trim().parse::<f64>().ok()?;
    Coordinates::new(latitude, longitude)
}

/// Parses a raw cell as coordinates. Non-text cells are never coordinates.
#[must_use]
pub fn parse_coordinates_value(value: Option<&RawValue>) -> Option<Coordinates> {
    match value {
        Some(RawValue::Text(text)) => parse_coordinates(text),
        Some(RawValue::Number(_) | RawValue::Missing) | None => None,
    }
}

/// Parses a raw cell as a finite number.
#[must_use]
pub fn parse_number(value: Option<&RawValue>) -> Option<f64> {
    match value? {
        RawValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        RawValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
        RawValue::Missing => None,
    }
}

/// Extracts the year from a date string.
///
/// Accepts RFC 3339, the common date and date-time layouts in
/// [`DATE_FORMATS`] and [`DATETIME_FORMATS`], `YYYY-MM`, and a bare
/// four-digit year.
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.year());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date.year());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(date.year());
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().ok();
    }
    None
}

/// Parses a raw cell as a date and extracts the year.
#[must_use]
pub fn parse_year_value(value: Option<&RawValue>) -> Option<i32> {
    match value? {
        RawValue::Text(text) => parse_year(text),
        RawValue::Number(_) | RawValue::Missing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_coordinates() {
        let c = parse_coordinates("45.0, -122.3").unwrap();
        assert!((c.latitude - 45.0).abs() < f64::EPSILON);
        assert!((c.longitude - -122.3).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_coordinates_without_space() {
        let c = parse_coordinates("10,20").unwrap();
        assert!((c.latitude - 10.0).abs() < f64::EPSILON);
        assert!((c.longitude - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(parse_coordinates("91,0").is_none());
        assert!(parse_coordinates("-90.5, 10").is_none());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(parse_coordinates("0, 180.1").is_none());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_coordinates("10").is_none());
        assert!(parse_coordinates("10,20,30").is_none());
        assert!(parse_coordinates("").is_none());
        assert!(parse_coordinates("-").is_none());
    }

    #[test]
    fn rejects_non_numeric_parts() {
        assert!(parse_coordinates("bad").is_none());
        assert!(parse_coordinates("north, 20").is_none());
        assert!(parse_coordinates("NaN, 20").is_none());
        assert!(parse_coordinates("10, inf").is_none());
    }

    #[test]
    fn coordinates_only_from_text_cells() {
        assert!(parse_coordinates_value(Some(&RawValue::Number(10.0))).is_none());
        assert!(parse_coordinates_value(Some(&RawValue::Missing)).is_none());
        assert!(parse_coordinates_value(None).is_none());
    }

    #[test]
    fn parses_numbers_from_text_and_numeric_cells() {
        let text = RawValue::Text(" 12.5 ".to_string());
        assert_eq!(parse_number(Some(&text)), Some(12.5));
        assert_eq!(parse_number(Some(&RawValue::Number(3.0))), Some(3.0));
        assert_eq!(
            parse_number(Some(&RawValue::Text("approx 20".to_string()))),
            None
        );
        assert_eq!(parse_number(Some(&RawValue::Missing)), None);
    }

    #[test]
    fn parses_years_from_common_layouts() {
        assert_eq!(parse_year("2021-07-30"), Some(2021));
        assert_eq!(parse_year("2019-04-19 00:00:00"), Some(2019));
        assert_eq!(parse_year("09/16/2022"), Some(2022));
        assert_eq!(parse_year("September 16, 2022"), Some(2022));
        assert_eq!(parse_year("2020-05"), Some(2020));
        assert_eq!(parse_year("2018"), Some(2018));
        assert_eq!(parse_year("2023-01-05T10:00:00Z"), Some(2023));
    }

    #[test]
    fn unknown_year_is_none_not_zero() {
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("-"), None);
        assert_eq!(parse_year(""), None);
    }
}
