//! Dashboard configuration.
//!
//! The default configuration is embedded at compile time from
//! `config/default.toml`. A deployment can replace it wholesale with a file
//! named by `--config` or the `BESS_MAP_CONFIG` environment variable.

use std::path::{Path, PathBuf};

use bess_map_incident_models::{ColumnKind, Schema};
use bess_map_preview_models::PreviewConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "BESS_MAP_CONFIG";

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`DashboardConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file parsed but is inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Marker colour thresholds applied to the capacity column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Values below this are "low".
    pub low_below: f64,
    /// Values at or above this are "high".
    pub high_at: f64,
    /// Colour of the selected location's marker.
    pub selected: String,
    pub low: String,
    pub mid: String,
    pub high: String,
    /// Colour for non-numeric values.
    pub unknown: String,
}

impl MarkerConfig {
    /// Returns the colour for a capacity value.
    #[must_use]
    pub fn color_for(&self, value: Option<f64>) -> &str {
        match value {
            Some(v) if v.is_finite() && v < self.low_below => &self.low,
            Some(v) if v.is_finite() && v < self.high_at => &self.mid,
            Some(v) if v.is_finite() => &self.high,
            _ => &self.unknown,
        }
    }
}

/// Map viewport defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Full-extent centre latitude.
    pub latitude: f64,
    /// Full-extent centre longitude.
    pub longitude: f64,
    /// Full-extent zoom.
    pub zoom: f64,
    /// Zoom used when centring on the selected location.
    pub selected_zoom: f64,
}

/// Maps country text to a flag image. The first rule with a needle
/// contained in the lowercased country wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRule {
    /// Lowercase substrings to look for.
    pub needles: Vec<String>,
    /// Flag image URL.
    pub url: String,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub schema: Schema,
    pub markers: MarkerConfig,
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub flags: Vec<FlagRule>,
}

impl DashboardConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded dashboard config: {e}"))
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or fails
    /// [`Self::validate`].
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Loads the configuration from `explicit`, else from the file named by
    /// [`CONFIG_ENV`], else the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a named file cannot be loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => Self::from_path(&path),
            None => {
                log::debug!("Using embedded dashboard config");
                Ok(Self::embedded())
            }
        }
    }

    /// Checks that thresholds are ordered and every column role names a
    /// declared column.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        let markers = &self.markers;
        if markers.low_below.is_nan() || markers.high_at.is_nan() || markers.low_below > markers.high_at {
            return invalid(format!(
                "markers.low_below ({}) must not exceed markers.high_at ({})",
                markers.low_below, markers.high_at
            ));
        }
        if self.schema.source_urls.len() > 3 {
            return invalid(format!(
                "at most three source URL columns are supported, got {}",
                self.schema.source_urls.len()
            ));
        }

        let schema = &self.schema;
        let roles = [
            ("location", Some(&schema.location)),
            ("country", Some(&schema.country)),
            ("coordinates", Some(&schema.coordinates)),
            ("capacity", Some(&schema.capacity)),
            ("date", schema.date.as_ref()),
            ("image_source", schema.image_source.as_ref()),
        ];
        let url_roles = schema.source_urls.iter().map(|c| ("source_urls", Some(c)));
        for (role, column) in roles.into_iter().chain(url_roles) {
            let Some(column) = column else { continue };
            if !schema.columns.iter().any(|c| &c.name == column) {
                return invalid(format!("schema.{role} names undeclared column {column:?}"));
            }
        }

        if schema.kind_of(&schema.capacity) != Some(ColumnKind::Numeric) {
            return invalid(format!(
                "capacity column {:?} must be numeric",
                schema.capacity
            ));
        }
        if let Some(date) = &schema.date
            && schema.kind_of(date) != Some(ColumnKind::Date)
        {
            return invalid(format!("date column {date:?} must have kind \"date\""));
        }

        Ok(())
    }

    /// Returns the flag image URL for a country, if one is configured.
    #[must_use]
    pub fn flag_url(&self, country: &str) -> Option<&str> {
        let country = country.to_lowercase();
        self.flags
            .iter()
            .find(|rule| rule.needles.iter().any(|n| country.contains(n.as_str())))
            .map(|rule| rule.url.as_str())
    }
}
