#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View-model types for the dashboard.
//!
//! A [`DashboardView`] is everything a renderer needs to draw the map, the
//! card list, and the status line for one session. It is derived fresh
//! after every event and never mutated by the renderer. The renderer
//! reports clicks back as [`SelectionEvent`]s.

use bess_map_incident_models::{FilterSpec, LocationKey};
use bess_map_preview_models::Preview;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Prefix of every card element id.
pub const CARD_ID_PREFIX: &str = "card-";

/// Shown when the current filter matches no rows.
pub const NO_MATCHES_MESSAGE: &str = "No data matches the filter criteria.";

/// Shown when rows match but none of them can be placed on the map.
pub const NO_COORDINATES_MESSAGE: &str = "No valid lat/lon data for map.";

/// Returns the card element id for a location key.
#[must_use]
pub fn card_id(key: &LocationKey) -> String {
    format!("{CARD_ID_PREFIX}{key}")
}

/// The currently selected location, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "locationKey", rename_all = "camelCase")]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(LocationKey),
}

impl SelectionState {
    /// The selected key, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&LocationKey> {
        match self {
            Self::Unselected => None,
            Self::Selected(key) => Some(key),
        }
    }

    /// Whether `key` is the selected location.
    #[must_use]
    pub fn is_selected(&self, key: &LocationKey) -> bool {
        self.key() == Some(key)
    }
}

/// Which view produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Map,
    Card,
}

/// One input to the selection state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum SelectionEvent {
    /// A map marker was clicked. `label` is the marker's hover text.
    MapClicked {
        #[serde(default)]
        label: Option<String>,
    },
    /// A card was clicked.
    CardClicked { location_key: LocationKey },
    /// A filter was applied.
    FilterApplied,
    /// The filter was reset.
    FilterReset,
}

/// A map centre and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Centre latitude.
    pub latitude: f64,
    /// Centre longitude.
    pub longitude: f64,
    /// Zoom level.
    pub zoom: f64,
}

/// One map marker per location with valid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerView {
    /// Location the marker represents.
    pub location_key: LocationKey,
    /// Hover label. Feeding it back as a map click selects this marker.
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Marker size (the incident count).
    pub size: usize,
    /// CSS colour.
    pub color: String,
    /// Whether this is the selected location.
    pub highlighted: bool,
}

/// A capacity value shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerBadge {
    /// Display text, e.g. `20 MW`.
    pub text: String,
    /// CSS colour from the marker thresholds.
    pub color: String,
}

/// A labelled line of card details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailLine {
    pub label: String,
    /// Member-row values joined with `, `.
    pub value: String,
}

/// A source link decorated with its cached preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLink {
    pub url: String,
    pub preview: Preview,
}

/// One card per location summary, in first-encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// Element id, `card-<locationKey>`.
    pub id: String,
    /// Key submitted back on a card click.
    pub location_key: LocationKey,
    /// `<display name> (<n> incidents)`.
    pub title: String,
    pub country: String,
    /// Country flag image URL, if the country is recognised.
    pub flag_url: Option<String>,
    pub capacities: Vec<PowerBadge>,
    pub details: Vec<DetailLine>,
    /// Source URLs that point directly at images.
    pub images: Vec<String>,
    pub sources: Vec<SourceLink>,
    pub highlighted: bool,
}

/// Everything a renderer needs for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub markers: Vec<MarkerView>,
    pub cards: Vec<CardView>,
    pub viewport: Viewport,
    /// The stored selection, even if it is not in the current view.
    pub selected: Option<LocationKey>,
    /// Card id to scroll into view, set only when the selected location
    /// is in the current view.
    pub scroll_to: Option<String>,
    /// Empty-state message for the map and card list.
    pub empty_message: Option<String>,
    /// Outcome of the last filter operation.
    pub status: Option<String>,
    /// Describes the last selection, e.g. `Selected location (map): Plant B`.
    pub selection_message: Option<String>,
    /// The active filter.
    pub filter: Option<FilterSpec>,
}

/// Columns offered by the filter and chart controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsView {
    pub filterable: Vec<String>,
    pub chartable: Vec<String>,
}
