#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the dashboard server.
//!
//! Views, chart data, and filters are the dashboard's own types; this crate
//! only adds the envelopes around them.

use bess_map_dashboard_models::SelectionEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use bess_map_dashboard_models::{ColumnsView, DashboardView};
pub use bess_map_incident_models::{ChartData, FilterSpec};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of ingested incident rows.
    pub rows: usize,
    /// Number of open sessions.
    pub sessions: usize,
}

/// Response to creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSessionCreated {
    pub session_id: Uuid,
}

/// Body of a selection request: the triggers that fired in one
/// synchronization step. Only the last one is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub triggers: Vec<SelectionEvent>,
}

/// Query parameters for the chart endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQueryParams {
    /// Column to group by. Defaults to the country column.
    pub column: Option<String>,
}

/// Error body returned with 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
