#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Best-effort source link previews.
//!
//! [`http::HttpPreviewService`] fetches a page and extracts its `OpenGraph`
//! metadata ([`html`]). Fetch failures never escape: every outcome is a
//! [`Preview`], placeholders included. [`cache::PreviewCache`] keeps the
//! results in memory and persists them to a flat JSON file so that the
//! dashboard's render path only does lookups. [`prefetch`] fills the cache
//! for every source link in a dataset.

pub mod cache;
pub mod html;
pub mod http;
pub mod prefetch;
pub mod progress;

pub use bess_map_preview_models::{Preview, PreviewConfig, PreviewLookup};

/// Errors from preview cache persistence and client setup.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading or writing the cache file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something that can produce a [`Preview`] for a URL.
///
/// Implementations must not fail: unreachable, invalid, or disallowed URLs
/// yield placeholder previews.
pub trait PreviewService: Send + Sync {
    /// Fetches the preview for `url`.
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Preview> + Send;
}
