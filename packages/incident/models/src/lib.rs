#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident row, schema, and location summary types.
//!
//! These types describe the BESS fire incident table at every stage of
//! the pipeline: raw rows as produced by a data source ([`RawRow`]),
//! canonical rows after normalization ([`CanonicalRow`]), and per-location
//! aggregates ([`LocationSummary`]). The location key normalizer lives here
//! too so that every crate derives keys through the same function.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Name of the virtual column holding the year derived from the date column.
pub const YEAR_COLUMN: &str = "Year of Incident";

/// Placeholder rendered for text values that were absent in the source.
pub const MISSING_TEXT: &str = "-";

/// A single cell as read from the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// The cell was empty or not present.
    Missing,
    /// A numeric cell (spreadsheet sources).
    Number(f64),
    /// A text cell.
    Text(String),
}

impl RawValue {
    /// Builds a value from a text cell, mapping empty text to [`Self::Missing`].
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::Missing
        } else {
            Self::Text(trimmed.to_string())
        }
    }
}

/// One row of the incident table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    values: BTreeMap<String, RawValue>,
}

impl RawRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Sets a column value, returning the row for chaining.
    #[must_use]
    pub fn with(mut self, column: &str, value: RawValue) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a column value.
    pub fn insert(&mut self, column: &str, value: RawValue) {
        self.values.insert(column.to_string(), value);
    }

    /// Returns the value of a column, or `None` if the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.values.get(column)
    }

    /// Iterates over `(column, value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (K, RawValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A loaded table: the header columns in file order plus every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<RawRow>,
}

/// Declared type of a schema column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKind {
    /// Floating-point values; missing or unparseable cells become `0`.
    Numeric,
    /// Free text; missing cells become [`CellValue::Missing`].
    Text,
    /// A date kept as text, from which [`YEAR_COLUMN`] is derived.
    Date,
}

/// A column declared in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column header as it appears in the source.
    pub name: String,
    /// Declared type.
    pub kind: ColumnKind,
}

/// The known column set of the incident table plus the roles some columns
/// play in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Known columns in display order.
    pub columns: Vec<ColumnDef>,
    /// Column holding the facility name used for grouping.
    pub location: String,
    /// Column holding the country.
    pub country: String,
    /// Column holding `"<lat>, <lon>"` text.
    pub coordinates: String,
    /// Numeric column driving marker colours (e.g. capacity in MW).
    pub capacity: String,
    /// Date column from which [`YEAR_COLUMN`] is derived, if any.
    #[serde(default)]
    pub date: Option<String>,
    /// Columns holding source links.
    #[serde(default)]
    pub source_urls: Vec<String>,
    /// Source link column whose image URLs are rendered inline on cards.
    #[serde(default)]
    pub image_source: Option<String>,
}

impl Schema {
    /// Returns the declared kind of a column.
    ///
    /// [`YEAR_COLUMN`] is reported as numeric when the schema has a date
    /// column. Unknown columns return `None`.
    #[must_use]
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        if column == YEAR_COLUMN && self.date.is_some() {
            return Some(ColumnKind::Numeric);
        }
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }

    /// Whether the derived year column is available.
    #[must_use]
    pub const fn has_year(&self) -> bool {
        self.date.is_some()
    }

    /// Columns that must be present in every data source.
    #[must_use]
    pub fn required_columns(&self) -> Vec<&str> {
        vec![self.location.as_str()]
    }

    /// Columns offered in the filter dropdown.
    #[must_use]
    pub fn filterable_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.name != self.coordinates)
            .map(|c| c.name.clone())
            .collect();
        if self.has_year() {
            columns.push(YEAR_COLUMN.to_string());
        }
        columns
    }

    /// Columns offered in the bar chart dropdown.
    #[must_use]
    pub fn chartable_columns(&self) -> Vec<String> {
        let mut columns = vec![self.country.clone()];
        if self.has_year() {
            columns.push(YEAR_COLUMN.to_string());
        }
        columns
    }
}

/// A canonical cell value. Every known column of a [`CanonicalRow`] holds
/// one of these; nothing is left null.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A numeric value.
    Number(f64),
    /// A non-empty text value.
    Text(String),
    /// Absent in the source; rendered as [`MISSING_TEXT`].
    Missing,
}

impl CellValue {
    /// Returns the numeric value, parsing text if needed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Missing => None,
        }
    }

    /// Returns the text value, if this is a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) | Self::Missing => None,
        }
    }

    /// Whether the source had no value for this cell.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str(MISSING_TEXT),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Missing => serializer.serialize_str(MISSING_TEXT),
        }
    }
}

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair, returning `None` if either value is out
    /// of range or not finite.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }
}

/// Characters outside `[A-Za-z0-9]` and whitespace.
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s]+").expect("valid regex"));

/// Runs of whitespace.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Canonical identifier grouping incidents at the same facility.
///
/// The only way to build one is [`LocationKey::normalize`] (deserialization
/// goes through it too), so keys from ingestion, map clicks, and card
/// clicks always agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LocationKey(String);

impl LocationKey {
    /// Normalizes a raw location label.
    ///
    /// The pipeline:
    /// 1. Strip every character outside `[A-Za-z0-9]` and whitespace
    /// 2. Collapse whitespace runs to a single space
    /// 3. Trim
    ///
    /// `"Plant A, Inc."` and `"Plant  A Inc"` both become `"Plant A Inc"`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let stripped = NON_ALNUM_RE.replace_all(raw.trim(), "");
        let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
        Self(collapsed.trim().to_string())
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing behind.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for LocationKey {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<&str> for LocationKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<LocationKey> for String {
    fn from(key: LocationKey) -> Self {
        key.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A normalized incident row.
///
/// `fields` has an entry for every schema column (and for [`YEAR_COLUMN`]
/// when the schema has a date column). Columns found in the source but not
/// declared in the schema land in `extra` as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRow {
    /// Location text as it appeared in the source.
    pub location: String,
    /// Normalized grouping key derived from `location`.
    pub location_key: LocationKey,
    /// Country text, or [`MISSING_TEXT`].
    pub country: String,
    /// Parsed coordinates, if the coordinate text was valid.
    pub coordinates: Option<Coordinates>,
    /// Year derived from the date column, if parseable.
    pub year: Option<i32>,
    /// Values of every known column.
    pub fields: BTreeMap<String, CellValue>,
    /// Values of columns not declared in the schema.
    pub extra: BTreeMap<String, CellValue>,
}

impl CanonicalRow {
    /// Looks up a column in the known fields, then in the overflow map.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column).or_else(|| self.extra.get(column))
    }
}

/// Aggregate of every row sharing a [`LocationKey`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    /// Grouping key.
    pub location_key: LocationKey,
    /// Location text of the first member row.
    pub display_name: String,
    /// Coordinates of the first member row that has valid ones.
    pub coordinates: Option<Coordinates>,
    /// Country of the first member row.
    pub country: String,
    /// Number of member rows.
    pub incident_count: usize,
    /// Every non-grouping column's values across member rows, in row order.
    pub aggregated_fields: BTreeMap<String, Vec<CellValue>>,
}

impl LocationSummary {
    /// Returns the member values of a column (empty if never seen).
    #[must_use]
    pub fn values(&self, column: &str) -> &[CellValue] {
        self.aggregated_fields
            .get(column)
            .map_or(&[], Vec::as_slice)
    }
}

/// A user-specified filter: keep rows whose `column` matches `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Column to filter on.
    pub column: String,
    /// Query text (parsed as a number for numeric columns).
    pub value: String,
}

impl FilterSpec {
    /// Creates a filter spec.
    #[must_use]
    pub fn new(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// One bar of the incident count chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBar {
    /// Group label.
    pub label: String,
    /// Number of incidents in the group.
    pub count: usize,
}

/// Incident counts grouped by a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Column the bars are grouped by.
    pub column: String,
    /// Chart title.
    pub title: String,
    /// Bars sorted by label.
    pub bars: Vec<ChartBar>,
}
