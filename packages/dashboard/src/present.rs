//! Derivation of the renderable view from summaries and selection.
//!
//! Everything here is a pure function of its inputs. A selected key that is
//! not among the current summaries renders exactly like no selection; the
//! stored state is not touched, so the highlight returns as soon as the key
//! is back in view.

use std::collections::BTreeSet;

use bess_map_dashboard_models::{
    CardView, DashboardView, DetailLine, MarkerView, NO_COORDINATES_MESSAGE, NO_MATCHES_MESSAGE,
    PowerBadge, SourceLink, Viewport, card_id,
};
use bess_map_incident_models::{CellValue, LocationSummary, MISSING_TEXT, Schema, YEAR_COLUMN};
use bess_map_preview_models::PreviewLookup;

use crate::config::DashboardConfig;
use crate::selection::SelectionState;

/// Extensions of source URLs rendered inline as images.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".jpeg", ".webp"];

/// Label of the incident count detail line.
const INCIDENT_COUNT_LABEL: &str = "Number of Incidents";

/// Builds the view for `summaries` under `selection`.
///
/// Status, selection message, and active filter are left empty for the
/// session to fill in.
#[must_use]
pub fn present(
    config: &DashboardConfig,
    schema: &Schema,
    summaries: &[LocationSummary],
    selection: &SelectionState,
    previews: &dyn PreviewLookup,
) -> DashboardView {
    let visible = visible_selection(summaries, selection);

    let markers: Vec<MarkerView> = summaries
        .iter()
        .filter_map(|s| marker(config, schema, s, visible))
        .collect();

    let cards: Vec<CardView> = summaries
        .iter()
        .map(|s| card(config, schema, s, visible, previews))
        .collect();

    let empty_message = if summaries.is_empty() {
        Some(NO_MATCHES_MESSAGE.to_string())
    } else if markers.is_empty() {
        Some(NO_COORDINATES_MESSAGE.to_string())
    } else {
        None
    };

    DashboardView {
        markers,
        cards,
        viewport: viewport(config, visible),
        selected: selection.key().cloned(),
        scroll_to: visible.map(|s| card_id(&s.location_key)),
        empty_message,
        status: None,
        selection_message: None,
        filter: None,
    }
}

/// The selected summary, if the selection is in the current view.
#[must_use]
pub fn visible_selection<'a>(
    summaries: &'a [LocationSummary],
    selection: &SelectionState,
) -> Option<&'a LocationSummary> {
    let key = selection.key()?;
    summaries.iter().find(|s| &s.location_key == key)
}

fn is_highlighted(summary: &LocationSummary, visible: Option<&LocationSummary>) -> bool {
    visible.is_some_and(|v| v.location_key == summary.location_key)
}

/// Centres on the selected location when it is visible and has coordinates,
/// otherwise the full extent.
fn viewport(config: &DashboardConfig, visible: Option<&LocationSummary>) -> Viewport {
    let defaults = &config.viewport;
    match visible.and_then(|s| s.coordinates) {
        Some(c) => Viewport {
            latitude: c.latitude,
            longitude: c.longitude,
            zoom: defaults.selected_zoom,
        },
        None => Viewport {
            latitude: defaults.latitude,
            longitude: defaults.longitude,
            zoom: defaults.zoom,
        },
    }
}

fn marker(
    config: &DashboardConfig,
    schema: &Schema,
    summary: &LocationSummary,
    visible: Option<&LocationSummary>,
) -> Option<MarkerView> {
    let coordinates = summary.coordinates?;
    let highlighted = is_highlighted(summary, visible);
    let color = if highlighted {
        config.markers.selected.clone()
    } else {
        let capacity = summary
            .values(&schema.capacity)
            .first()
            .and_then(CellValue::as_number);
        config.markers.color_for(capacity).to_string()
    };

    Some(MarkerView {
        location_key: summary.location_key.clone(),
        label: summary.display_name.clone(),
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
        size: summary.incident_count,
        color,
        highlighted,
    })
}

fn card(
    config: &DashboardConfig,
    schema: &Schema,
    summary: &LocationSummary,
    visible: Option<&LocationSummary>,
    previews: &dyn PreviewLookup,
) -> CardView {
    let capacities = summary
        .values(&schema.capacity)
        .iter()
        .map(|v| PowerBadge {
            text: format!("{v} MW"),
            color: config.markers.color_for(v.as_number()).to_string(),
        })
        .collect();

    let images = schema
        .image_source
        .as_deref()
        .map(|column| {
            text_values(summary, column)
                .filter(|url| is_image_url(url))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    let sources = schema
        .source_urls
        .iter()
        .flat_map(|column| text_values(summary, column))
        .filter(|url| seen.insert(*url))
        .map(|url| SourceLink {
            url: url.to_string(),
            preview: previews.lookup(url),
        })
        .collect();

    CardView {
        id: card_id(&summary.location_key),
        location_key: summary.location_key.clone(),
        title: format!(
            "{} ({} incidents)",
            summary.display_name, summary.incident_count
        ),
        country: summary.country.clone(),
        flag_url: config.flag_url(&summary.country).map(ToString::to_string),
        capacities,
        details: details(schema, summary),
        images,
        sources,
        highlighted: is_highlighted(summary, visible),
    }
}

/// Detail lines in schema column order, then the derived year, then
/// undeclared columns, then the incident count.
fn details(schema: &Schema, summary: &LocationSummary) -> Vec<DetailLine> {
    let excluded: Vec<&str> = [
        Some(schema.location.as_str()),
        Some(schema.coordinates.as_str()),
        Some(schema.capacity.as_str()),
        schema.image_source.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    let declared = schema.columns.iter().map(|c| c.name.as_str());
    let year = schema.has_year().then_some(YEAR_COLUMN);
    let undeclared = summary
        .aggregated_fields
        .keys()
        .map(String::as_str)
        .filter(|k| *k != YEAR_COLUMN && schema.kind_of(k).is_none());

    let mut lines: Vec<DetailLine> = declared
        .chain(year)
        .chain(undeclared)
        .filter(|column| !excluded.contains(column))
        .map(|column| DetailLine {
            label: column.to_string(),
            value: join_values(summary.values(column)),
        })
        .collect();

    lines.push(DetailLine {
        label: INCIDENT_COUNT_LABEL.to_string(),
        value: summary.incident_count.to_string(),
    });
    lines
}

fn join_values(values: &[CellValue]) -> String {
    if values.is_empty() {
        return MISSING_TEXT.to_string();
    }
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn text_values<'a>(summary: &'a LocationSummary, column: &str) -> impl Iterator<Item = &'a str> {
    summary
        .values(column)
        .iter()
        .filter_map(CellValue::as_text)
        .filter(|s| *s != MISSING_TEXT)
}

fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
pub(crate) mod test_support {
    use bess_map_dashboard_models::DashboardView;
    use bess_map_incident_models::LocationKey;

    /// Whether `key` is highlighted in `view`'s cards.
    pub fn is_card_highlighted(view: &DashboardView, key: &LocationKey) -> bool {
        view.cards
            .iter()
            .any(|c| c.highlighted && &c.location_key == key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bess_map_incident_models::{Coordinates, LocationKey};
    use bess_map_preview_models::{NoPreviews, Preview, UNAVAILABLE_TITLE};

    use super::*;

    fn config() -> DashboardConfig {
        DashboardConfig::embedded()
    }

    fn summary(name: &str, coordinates: Option<(f64, f64)>, capacity: &[f64]) -> LocationSummary {
        let schema = config().schema;
        let mut fields = BTreeMap::new();
        fields.insert(
            schema.capacity.clone(),
            capacity.iter().map(|c| CellValue::Number(*c)).collect(),
        );
        fields.insert(
            "Country".to_string(),
            vec![CellValue::Text("USA".to_string())],
        );
        LocationSummary {
            location_key: LocationKey::normalize(name),
            display_name: name.to_string(),
            coordinates: coordinates.and_then(|(lat, lon)| Coordinates::new(lat, lon)),
            country: "USA".to_string(),
            incident_count: capacity.len().max(1),
            aggregated_fields: fields,
        }
    }

    fn selected(key: &str) -> SelectionState {
        SelectionState::Selected(LocationKey::from(key))
    }

    #[test]
    fn highlights_selected_marker_and_card() {
        let config = config();
        let summaries = vec![
            summary("Plant A, Inc.", Some((10.0, 20.0)), &[5.0, 20.0]),
            summary("Plant B", Some((-33.0, 151.0)), &[60.0]),
        ];
        let view = present(
            &config,
            &config.schema,
            &summaries,
            &selected("Plant A Inc"),
            &NoPreviews,
        );

        assert_eq!(view.markers.len(), 2);
        assert!(view.markers[0].highlighted);
        assert_eq!(view.markers[0].color, "blue");
        assert!(!view.markers[1].highlighted);
        assert_eq!(view.markers[1].color, "red");

        assert!(view.cards[0].highlighted);
        assert!(!view.cards[1].highlighted);
        assert_eq!(view.scroll_to.as_deref(), Some("card-Plant A Inc"));

        assert!((view.viewport.latitude - 10.0).abs() < f64::EPSILON);
        assert!((view.viewport.longitude - 20.0).abs() < f64::EPSILON);
        assert!((view.viewport.zoom - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unselected_marker_color_uses_first_capacity() {
        let config = config();
        let summaries = vec![summary("Plant A", Some((1.0, 1.0)), &[5.0, 60.0])];
        let view = present(
            &config,
            &config.schema,
            &summaries,
            &SelectionState::Unselected,
            &NoPreviews,
        );
        assert_eq!(view.markers[0].color, "green");
        assert_eq!(view.markers[0].size, 2);
        assert_eq!(view.markers[0].label, "Plant A");
        assert_eq!(view.scroll_to, None);
        assert!((view.viewport.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn absent_selection_renders_as_unselected() {
        let config = config();
        let summaries = vec![summary("Plant A", Some((1.0, 1.0)), &[5.0])];
        let view = present(
            &config,
            &config.schema,
            &summaries,
            &selected("Plant B"),
            &NoPreviews,
        );
        assert_eq!(view.selected, Some(LocationKey::from("Plant B")));
        assert!(view.cards.iter().all(|c| !c.highlighted));
        assert!(view.markers.iter().all(|m| !m.highlighted));
        assert_eq!(view.scroll_to, None);
        assert!((view.viewport.zoom - config.viewport.zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn selection_without_coordinates_keeps_default_viewport() {
        let config = config();
        let summaries = vec![
            summary("Plant A", Some((1.0, 1.0)), &[5.0]),
            summary("Plant B", None, &[5.0]),
        ];
        let view = present(
            &config,
            &config.schema,
            &summaries,
            &selected("Plant B"),
            &NoPreviews,
        );
        assert!(view.cards[1].highlighted);
        assert_eq!(view.scroll_to.as_deref(), Some("card-Plant B"));
        assert!((view.viewport.zoom - config.viewport.zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_states() {
        let config = config();
        let view = present(
            &config,
            &config.schema,
            &[],
            &SelectionState::Unselected,
            &NoPreviews,
        );
        assert_eq!(view.empty_message.as_deref(), Some(NO_MATCHES_MESSAGE));
        assert!(view.cards.is_empty());

        let summaries = vec![summary("Plant B", None, &[1.0])];
        let view = present(
            &config,
            &config.schema,
            &summaries,
            &SelectionState::Unselected,
            &NoPreviews,
        );
        assert_eq!(view.empty_message.as_deref(), Some(NO_COORDINATES_MESSAGE));
        assert!(view.markers.is_empty());
        assert_eq!(view.cards.len(), 1);
    }

    #[test]
    fn card_contents() {
        let config = config();
        let mut s = summary("Plant A, Inc.", Some((10.0, 20.0)), &[5.0, 20.0]);
        s.aggregated_fields.insert(
            "Source URL 1".to_string(),
            vec![
                CellValue::Text("https://example.com/fire.JPG?w=200".to_string()),
                CellValue::Text("https://example.com/report".to_string()),
            ],
        );
        s.aggregated_fields.insert(
            "Source URL 2".to_string(),
            vec![
                CellValue::Text("https://example.com/report".to_string()),
                CellValue::Missing,
            ],
        );
        s.aggregated_fields.insert(
            YEAR_COLUMN.to_string(),
            vec![CellValue::Number(2021.0), CellValue::Missing],
        );
        s.aggregated_fields.insert(
            "Notes".to_string(),
            vec![CellValue::Text("Thermal runaway".to_string())],
        );

        let mut previews = BTreeMap::new();
        previews.insert(
            "https://example.com/report".to_string(),
            Preview {
                title: "Fire report".to_string(),
                description: String::new(),
                image: String::new(),
                url: "https://example.com/report".to_string(),
            },
        );

        let view = present(
            &config,
            &config.schema,
            &[s],
            &SelectionState::Unselected,
            &previews,
        );
        let card = &view.cards[0];

        assert_eq!(card.id, "card-Plant A Inc");
        assert_eq!(card.title, "Plant A, Inc. (2 incidents)");
        assert_eq!(card.flag_url.as_deref(), Some("https://flagcdn.com/us.svg"));
        assert_eq!(
            card.capacities,
            vec![
                PowerBadge {
                    text: "5 MW".to_string(),
                    color: "green".to_string()
                },
                PowerBadge {
                    text: "20 MW".to_string(),
                    color: "orange".to_string()
                },
            ]
        );
        assert_eq!(card.images, vec!["https://example.com/fire.JPG?w=200".to_string()]);

        let urls: Vec<&str> = card.sources.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/fire.JPG?w=200", "https://example.com/report"]
        );
        assert_eq!(card.sources[0].preview.title, UNAVAILABLE_TITLE);
        assert_eq!(card.sources[1].preview.title, "Fire report");

        let labels: Vec<&str> = card.details.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Country",
                "Date of Incident",
                "Source URL 2",
                "Source URL 3",
                YEAR_COLUMN,
                "Notes",
                "Number of Incidents",
            ]
        );
        let value = |label: &str| {
            card.details
                .iter()
                .find(|d| d.label == label)
                .map(|d| d.value.clone())
                .unwrap()
        };
        assert_eq!(value(YEAR_COLUMN), "2021, -");
        assert_eq!(value("Source URL 3"), "-");
        assert_eq!(value("Number of Incidents"), "2");
    }
}
