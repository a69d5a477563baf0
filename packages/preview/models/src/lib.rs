#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source link preview types.
//!
//! A [`Preview`] is the title/description/image metadata shown next to a
//! source link on an incident card. Previews are fetched ahead of time by
//! `bess_map_preview`; the dashboard only ever reads them through
//! [`PreviewLookup`], which never touches the network.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Title of the placeholder for malformed or non-HTTP URLs.
pub const INVALID_URL_TITLE: &str = "Invalid URL";

/// Title of the placeholder for URLs that could not be fetched or were not
/// fetched yet.
pub const UNAVAILABLE_TITLE: &str = "Preview Unavailable";

/// URL recorded on the placeholder for an empty link.
pub const NO_URL: &str = "N/A";

/// Metadata describing a source URL.
///
/// This is also the value type of the persisted cache file, a flat JSON
/// object mapping each URL to one of these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// Page title, or a placeholder title.
    pub title: String,
    /// Page description (may be empty).
    pub description: String,
    /// Preview image URL (may be empty).
    pub image: String,
    /// The URL this preview describes.
    pub url: String,
}

/// Why a [`Preview`] holds placeholder content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// The URL was empty or not `http(s)`.
    InvalidUrl,
    /// The URL belongs to a domain that is never fetched.
    SkippedDomain {
        /// The matched domain.
        domain: String,
    },
    /// The fetch failed, timed out, or was never attempted.
    Unavailable,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl Preview {
    /// Builds a placeholder preview.
    #[must_use]
    pub fn placeholder(reason: &PlaceholderReason, url: &str) -> Self {
        let title = match reason {
            PlaceholderReason::InvalidUrl => INVALID_URL_TITLE.to_string(),
            PlaceholderReason::SkippedDomain { domain } => {
                format!("{} Link (Preview Skipped)", capitalize(domain))
            }
            PlaceholderReason::Unavailable => UNAVAILABLE_TITLE.to_string(),
        };
        let url = if url.trim().is_empty() { NO_URL } else { url };
        Self {
            title,
            description: String::new(),
            image: String::new(),
            url: url.to_string(),
        }
    }

    /// Shorthand for the [`PlaceholderReason::Unavailable`] placeholder.
    #[must_use]
    pub fn unavailable(url: &str) -> Self {
        Self::placeholder(&PlaceholderReason::Unavailable, url)
    }

    /// Whether this preview carries placeholder content rather than page
    /// metadata.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.title == INVALID_URL_TITLE
            || self.title == UNAVAILABLE_TITLE
            || self.title.ends_with("Link (Preview Skipped)")
    }
}

/// Settings for fetching previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Domains that are never fetched (file lockers and the like).
    pub skipped_domains: Vec<String>,
    /// Maximum characters kept from a page title.
    pub title_max_chars: usize,
    /// Maximum characters kept from a page description.
    pub description_max_chars: usize,
    /// Number of fetches in flight during a bulk prefetch.
    pub concurrency: usize,
    /// Path of the persisted cache file.
    pub cache_path: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            skipped_domains: vec!["box.com".to_string()],
            title_max_chars: 100,
            description_max_chars: 200,
            concurrency: 8,
            cache_path: "url_previews.json".to_string(),
        }
    }
}

/// Read-only access to previously fetched previews.
pub trait PreviewLookup {
    /// Returns the preview for `url`, or the unavailable placeholder on a
    /// miss.
    fn lookup(&self, url: &str) -> Preview;
}

/// A lookup that has nothing cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreviews;

impl PreviewLookup for NoPreviews {
    fn lookup(&self, url: &str) -> Preview {
        Preview::unavailable(url)
    }
}

impl PreviewLookup for BTreeMap<String, Preview> {
    fn lookup(&self, url: &str) -> Preview {
        self.get(url)
            .cloned()
            .unwrap_or_else(|| Preview::unavailable(url))
    }
}
