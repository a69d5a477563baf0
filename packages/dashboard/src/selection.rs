//! The selection state machine shared by the map and the card list.
//!
//! A session holds exactly one [`SelectionState`]. It starts
//! [`SelectionState::Unselected`] and only a map or card click on a
//! location in the current view moves it. Filter events are accepted and
//! logged but never change it, so a selection survives any filter history. Whether the selected location is
//! visible is decided at render time by [`crate::present`].
//!
//! Renderers may report several triggers for one synchronization step (a
//! map click and a card click landing together). [`resolve_step`] keeps the
//! last one and drops the rest, so every step applies at most one event.

use std::fmt;

pub use bess_map_dashboard_models::{Channel, SelectionEvent, SelectionState};
use bess_map_incident_models::{LocationKey, LocationSummary};

/// Why an event did not select anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The step carried no trigger.
    NoTrigger,
    /// The map click had no label, or it normalized to nothing.
    MissingLabel,
    /// The map label names no location in the current summaries.
    UnknownLabel(LocationKey),
    /// The clicked card is not among the current summaries.
    UnknownCard(LocationKey),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTrigger => f.write_str("no trigger"),
            Self::MissingLabel => f.write_str("map click without a location label"),
            Self::UnknownLabel(key) => write!(f, "map label {key:?} is not in the current view"),
            Self::UnknownCard(key) => write!(f, "card {key:?} is not in the current view"),
        }
    }
}

/// The result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The event selected `key`. `changed` is false when `key` was already
    /// selected.
    Selected {
        key: LocationKey,
        channel: Channel,
        changed: bool,
    },
    /// A filter event; the selection is untouched.
    Unchanged,
    /// The event was a no-op.
    Ignored(IgnoreReason),
}

/// Picks the single trigger for a synchronization step: the last one.
/// Every other trigger is dropped with a warning.
#[must_use]
pub fn resolve_step(triggers: Vec<SelectionEvent>) -> Option<SelectionEvent> {
    let mut triggers = triggers;
    let last = triggers.pop()?;
    for dropped in &triggers {
        log::warn!(
            "Ignoring co-fired {} trigger, {} wins this step",
            dropped.as_ref(),
            last.as_ref()
        );
    }
    Some(last)
}

/// Owns a session's [`SelectionState`] and applies events to it one at a
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SelectionState::Unselected,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Applies one event. `current` is the summary set the renderer is
    /// showing; clicks on anything outside it leave the state alone.
    pub fn dispatch(&mut self, event: SelectionEvent, current: &[LocationSummary]) -> Transition {
        let shown = |key: &LocationKey| current.iter().any(|s| &s.location_key == key);
        let transition = match event {
            SelectionEvent::MapClicked { label } => {
                let key = label.as_deref().map(LocationKey::normalize);
                match key {
                    Some(key) if key.is_empty() => Transition::Ignored(IgnoreReason::MissingLabel),
                    Some(key) if shown(&key) => self.select(key, Channel::Map),
                    Some(key) => Transition::Ignored(IgnoreReason::UnknownLabel(key)),
                    None => Transition::Ignored(IgnoreReason::MissingLabel),
                }
            }
            SelectionEvent::CardClicked { location_key } => {
                if shown(&location_key) {
                    self.select(location_key, Channel::Card)
                } else {
                    Transition::Ignored(IgnoreReason::UnknownCard(location_key))
                }
            }
            SelectionEvent::FilterApplied | SelectionEvent::FilterReset => Transition::Unchanged,
        };

        match &transition {
            Transition::Selected {
                key,
                channel,
                changed,
            } => log::debug!("Selected location ({channel}): {key} (changed={changed})"),
            Transition::Unchanged => log::debug!("Filter event leaves selection {:?}", self.state),
            Transition::Ignored(reason) => log::debug!("Selection event ignored: {reason}"),
        }

        transition
    }

    /// Resolves a multi-trigger step with [`resolve_step`] and dispatches
    /// the winner.
    pub fn dispatch_step(
        &mut self,
        triggers: Vec<SelectionEvent>,
        current: &[LocationSummary],
    ) -> Transition {
        match resolve_step(triggers) {
            Some(event) => self.dispatch(event, current),
            None => Transition::Ignored(IgnoreReason::NoTrigger),
        }
    }

    /// Returns to [`SelectionState::Unselected`]. Only an explicit session
    /// reset does this.
    pub fn clear(&mut self) {
        self.state = SelectionState::Unselected;
    }

    fn select(&mut self, key: LocationKey, channel: Channel) -> Transition {
        let changed = !self.state.is_selected(&key);
        self.state = SelectionState::Selected(key.clone());
        Transition::Selected {
            key,
            channel,
            changed,
        }
    }
}
