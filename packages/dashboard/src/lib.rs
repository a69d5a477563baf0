#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive dashboard core for BESS fire incidents.
//!
//! A [`session::Session`] applies filters and selection events one at a
//! time against a shared, read-only [`bess_map_incident::Dataset`] and
//! derives a [`bess_map_dashboard_models::DashboardView`] through
//! [`present`]. Map clicks and card clicks drive a single
//! [`selection::SelectionController`], so both views always agree on what
//! is selected. No operation here performs I/O; previews are read through
//! [`bess_map_preview_models::PreviewLookup`].

pub mod config;
pub mod present;
pub mod selection;
pub mod session;

pub use config::{ConfigError, DashboardConfig};
pub use session::Session;
