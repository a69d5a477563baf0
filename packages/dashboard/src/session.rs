//! Per-user dashboard sessions.
//!
//! A [`Session`] owns everything one user can change: the active filter, the
//! rows and summaries it produced, the selection, and the last status
//! message. The ingested [`Dataset`] is shared read-only between sessions.
//! Each operation runs to completion before the next is accepted.

use std::sync::Arc;

use bess_map_dashboard_models::{ColumnsView, DashboardView};
use bess_map_incident::chart::chart_counts;
use bess_map_incident::filter::{self, FilteredRows};
use bess_map_incident::{Dataset, FilterError};
use bess_map_incident_models::{CanonicalRow, ChartData, ColumnKind, FilterSpec, LocationSummary};
use bess_map_preview_models::PreviewLookup;

use crate::config::DashboardConfig;
use crate::present::present;
use crate::selection::{SelectionController, SelectionEvent, SelectionState, Transition};

/// Status after a successful filter.
pub const FILTER_APPLIED: &str = "Filter applied.";

/// Status after a reset.
pub const FILTER_RESET: &str = "Filter reset.";

/// Status after a numeric filter value failed to parse.
pub const INVALID_NUMBER: &str = "Invalid numerical filter value.";

/// One user's view of the dataset.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Arc<Dataset>,
    filter: Option<FilterSpec>,
    filtered: FilteredRows,
    selection: SelectionController,
    status: Option<String>,
    selection_message: Option<String>,
}

impl Session {
    /// Starts an unfiltered, unselected session.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let filtered = FilteredRows::all(&dataset);
        Self {
            dataset,
            filter: None,
            filtered,
            selection: SelectionController::new(),
            status: None,
            selection_message: None,
        }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The active filter, if any.
    #[must_use]
    pub const fn filter(&self) -> Option<&FilterSpec> {
        self.filter.as_ref()
    }

    /// Summaries of the rows that pass the active filter.
    #[must_use]
    pub fn summaries(&self) -> &[LocationSummary] {
        &self.filtered.summaries
    }

    /// Rows that pass the active filter, in dataset order.
    pub fn rows(&self) -> impl Iterator<Item = &CanonicalRow> {
        let rows = self.dataset.rows();
        self.filtered.indices.iter().map(move |&i| &rows[i])
    }

    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// The last user-facing filter status.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Replaces the active filter.
    ///
    /// The filter runs against the full dataset, not the current filtered
    /// rows. On error the filter, rows, and selection are left as they were
    /// and only the status changes.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if the column is unknown, the value is blank,
    /// or a numeric column's value is not a number.
    pub fn apply_filter(&mut self, spec: FilterSpec) -> Result<(), FilterError> {
        match filter::apply(&self.dataset, Some(&spec)) {
            Ok(filtered) => {
                log::debug!(
                    "Applied filter {:?} = {:?}: {} locations",
                    spec.column,
                    spec.value,
                    filtered.summaries.len()
                );
                self.filtered = filtered;
                self.filter = Some(spec);
                self.status = Some(FILTER_APPLIED.to_string());
                self.selection
                    .dispatch(SelectionEvent::FilterApplied, &self.filtered.summaries);
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected filter {:?} = {:?}: {e}", spec.column, spec.value);
                self.status = Some(match &e {
                    FilterError::InvalidNumber { .. } => INVALID_NUMBER.to_string(),
                    FilterError::UnknownColumn { .. } | FilterError::EmptyValue { .. } => {
                        e.to_string()
                    }
                });
                Err(e)
            }
        }
    }

    /// Clears the filter, restoring the full ingested row set.
    pub fn reset_filter(&mut self) {
        log::debug!("Reset filter (was {:?})", self.filter);
        self.filtered = FilteredRows::all(&self.dataset);
        self.filter = None;
        self.status = Some(FILTER_RESET.to_string());
        self.selection
            .dispatch(SelectionEvent::FilterReset, &self.filtered.summaries);
    }

    /// Returns the session to its starting state: no filter, nothing
    /// selected, no messages.
    pub fn reset(&mut self) {
        log::debug!(
            "Reset session (filter {:?}, selection {:?})",
            self.filter,
            self.selection.state()
        );
        self.filtered = FilteredRows::all(&self.dataset);
        self.filter = None;
        self.selection.clear();
        self.status = None;
        self.selection_message = None;
    }

    /// Applies one selection event.
    pub fn dispatch(&mut self, event: SelectionEvent) -> Transition {
        self.dispatch_step(vec![event])
    }

    /// Applies one synchronization step. Only the last trigger counts.
    pub fn dispatch_step(&mut self, triggers: Vec<SelectionEvent>) -> Transition {
        let transition = self
            .selection
            .dispatch_step(triggers, &self.filtered.summaries);
        if let Transition::Selected { key, channel, .. } = &transition {
            self.selection_message = Some(format!("Selected location ({channel}): {key}"));
        }
        transition
    }

    /// Counts the filtered rows by `column`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownColumn`] if the column is neither
    /// declared nor present in the data.
    pub fn chart(&self, column: &str) -> Result<ChartData, FilterError> {
        let kind = self
            .dataset
            .column_kind(column)
            .ok_or_else(|| FilterError::UnknownColumn {
                column: column.to_string(),
            })?;
        Ok(chart_counts(
            self.rows(),
            column,
            kind == ColumnKind::Numeric,
        ))
    }

    /// Derives the current view.
    #[must_use]
    pub fn view(&self, config: &DashboardConfig, previews: &dyn PreviewLookup) -> DashboardView {
        let mut view = present(
            config,
            self.dataset.schema(),
            &self.filtered.summaries,
            self.selection.state(),
            previews,
        );
        view.status.clone_from(&self.status);
        view.selection_message.clone_from(&self.selection_message);
        view.filter.clone_from(&self.filter);
        view
    }
}

/// Columns offered by the filter and chart controls for `dataset`.
#[must_use]
pub fn columns(dataset: &Dataset) -> ColumnsView {
    ColumnsView {
        filterable: dataset.schema().filterable_columns(),
        chartable: dataset.schema().chartable_columns(),
    }
}

#[cfg(test)]
mod tests {
    use bess_map_incident_models::{LocationKey, RawRow, RawValue, YEAR_COLUMN};
    use bess_map_preview_models::NoPreviews;

    use super::*;
    use crate::present::test_support::is_card_highlighted;

    const COORDS: &str = "Custom location (Lat, Lon)";

    fn config() -> DashboardConfig {
        DashboardConfig::embedded()
    }

    fn row(location: &str, country: &str, lat_lon: &str, date: Option<&str>, mw: f64) -> RawRow {
        let text = |s: &str| RawValue::Text(s.to_string());
        RawRow::new()
            .with("Location", text(location))
            .with("Country", text(country))
            .with(COORDS, text(lat_lon))
            .with("Capacity (MW)", RawValue::Number(mw))
            .with("Date of Incident", date.map_or(RawValue::Missing, text))
    }

    fn dataset() -> Arc<Dataset> {
        let rows = vec![
            row("Plant A, Inc.", "USA", "10,20", Some("2021-07-30"), 5.0),
            row("Plant A Inc", "USA", "10,20", None, 20.0),
            row("Plant B", "Germany", "bad", Some("2022-01-01"), 60.0),
        ];
        Arc::new(Dataset::from_rows(config().schema, rows).unwrap())
    }

    fn key(s: &str) -> LocationKey {
        LocationKey::from(s)
    }

    fn card(s: &str) -> SelectionEvent {
        SelectionEvent::CardClicked {
            location_key: key(s),
        }
    }

    #[test]
    fn new_session_aggregates_everything() {
        let session = Session::new(dataset());
        let summaries = session.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].location_key, key("Plant A Inc"));
        assert_eq!(summaries[0].incident_count, 2);
        assert!(summaries[0].coordinates.is_some());
        assert_eq!(summaries[1].location_key, key("Plant B"));
        assert!(summaries[1].coordinates.is_none());

        let total: usize = summaries.iter().map(|s| s.incident_count).sum();
        assert_eq!(total, session.rows().count());
    }

    #[test]
    fn filter_matching_nothing_is_valid() {
        let config = config();
        let mut session = Session::new(dataset());
        session
            .apply_filter(FilterSpec::new("Country", "many"))
            .unwrap();

        assert!(session.summaries().is_empty());
        assert_eq!(session.status(), Some(FILTER_APPLIED));
        let chart = session.chart("Country").unwrap();
        assert!(chart.bars.is_empty());

        let view = session.view(&config, &NoPreviews);
        assert!(view.cards.is_empty());
        assert!(view.empty_message.is_some());
    }

    #[test]
    fn invalid_number_leaves_state_untouched() {
        let mut session = Session::new(dataset());
        session
            .apply_filter(FilterSpec::new("Country", "USA"))
            .unwrap();
        let before = session.summaries().to_vec();

        let err = session
            .apply_filter(FilterSpec::new("Capacity (MW)", "lots"))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidNumber { .. }));
        assert_eq!(session.status(), Some(INVALID_NUMBER));
        assert_eq!(session.summaries(), before.as_slice());
        assert_eq!(session.filter(), Some(&FilterSpec::new("Country", "USA")));
    }

    #[test]
    fn reset_restores_ingested_rows() {
        let data = dataset();
        let pristine = Session::new(Arc::clone(&data));
        let mut session = Session::new(data);

        session
            .apply_filter(FilterSpec::new("Country", "Germany"))
            .unwrap();
        session
            .apply_filter(FilterSpec::new("Capacity (MW)", "5"))
            .unwrap();
        session.reset_filter();
        session.reset_filter();

        assert_eq!(session.summaries(), pristine.summaries());
        assert!(session.rows().eq(pristine.rows()));
        assert_eq!(session.filter(), None);
        assert_eq!(session.status(), Some(FILTER_RESET));
    }

    #[test]
    fn selection_survives_filter_that_hides_it() {
        let config = config();
        let mut session = Session::new(dataset());
        session.dispatch(card("Plant B"));

        session
            .apply_filter(FilterSpec::new("Country", "USA"))
            .unwrap();
        assert_eq!(session.selection(), &SelectionState::Selected(key("Plant B")));
        let view = session.view(&config, &NoPreviews);
        assert!(!is_card_highlighted(&view, &key("Plant B")));
        assert_eq!(view.scroll_to, None);
        assert!((view.viewport.zoom - config.viewport.zoom).abs() < f64::EPSILON);

        session.reset_filter();
        let view = session.view(&config, &NoPreviews);
        assert!(is_card_highlighted(&view, &key("Plant B")));
        assert_eq!(view.scroll_to.as_deref(), Some("card-Plant B"));
    }

    #[test]
    fn reset_clears_filter_and_selection() {
        let config = config();
        let data = dataset();
        let pristine = Session::new(Arc::clone(&data));
        let mut session = Session::new(data);

        session.dispatch(card("Plant B"));
        session
            .apply_filter(FilterSpec::new("Country", "Germany"))
            .unwrap();
        session.reset();

        assert_eq!(session.selection(), &SelectionState::Unselected);
        assert_eq!(session.filter(), None);
        assert_eq!(session.status(), None);
        assert_eq!(session.summaries(), pristine.summaries());

        let view = session.view(&config, &NoPreviews);
        assert_eq!(view.selected, None);
        assert_eq!(view.selection_message, None);
        assert!(!is_card_highlighted(&view, &key("Plant B")));
    }

    #[test]
    fn map_click_on_unknown_label_keeps_selection() {
        let mut session = Session::new(dataset());
        session.dispatch(card("Plant B"));
        session.dispatch(SelectionEvent::MapClicked {
            label: Some("Plant Z".to_string()),
        });
        assert_eq!(session.selection(), &SelectionState::Selected(key("Plant B")));
    }

    #[test]
    fn map_then_card_selection() {
        let config = config();
        let mut session = Session::new(dataset());

        session.dispatch(SelectionEvent::MapClicked {
            label: Some("Plant B".to_string()),
        });
        assert_eq!(session.selection(), &SelectionState::Selected(key("Plant B")));

        session.dispatch(card("Plant A Inc"));
        assert_eq!(
            session.selection(),
            &SelectionState::Selected(key("Plant A Inc"))
        );

        let view = session.view(&config, &NoPreviews);
        assert_eq!(
            view.selection_message.as_deref(),
            Some("Selected location (card): Plant A Inc")
        );
        assert!(view.markers[0].highlighted);
        assert!((view.viewport.zoom - config.viewport.selected_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn map_labels_round_trip_to_keys() {
        let config = config();
        let mut session = Session::new(dataset());
        let label = session.view(&config, &NoPreviews).markers[0].label.clone();
        assert_eq!(label, "Plant A, Inc.");

        session.dispatch(SelectionEvent::MapClicked { label: Some(label) });
        let view = session.view(&config, &NoPreviews);
        assert!(view.markers[0].highlighted);
    }

    #[test]
    fn chart_by_year_skips_unknown_years() {
        let session = Session::new(dataset());
        let chart = session.chart(YEAR_COLUMN).unwrap();
        let labels: Vec<(&str, usize)> = chart
            .bars
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect();
        assert_eq!(labels, vec![("2021", 1), ("2022", 1)]);
        assert_eq!(chart.title, "Number of Incidents by Year of Incident");
    }

    #[test]
    fn chart_rejects_unknown_column() {
        let session = Session::new(dataset());
        assert!(matches!(
            session.chart("Nope"),
            Err(FilterError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn columns_exclude_coordinates() {
        let view = columns(&dataset());
        assert!(view.filterable.contains(&"Country".to_string()));
        assert!(view.filterable.contains(&YEAR_COLUMN.to_string()));
        assert!(!view.filterable.contains(&COORDS.to_string()));
        assert_eq!(
            view.chartable,
            vec!["Country".to_string(), YEAR_COLUMN.to_string()]
        );
    }
}
