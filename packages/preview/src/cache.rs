//! Persistent preview cache.
//!
//! The cache file is a flat JSON object mapping each URL to its
//! [`Preview`]. A missing file is an empty cache.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{Preview, PreviewError, PreviewLookup};

/// URL to [`Preview`] map, loaded once and read by every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewCache {
    entries: BTreeMap<String, Preview>,
}

impl PreviewCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Loads the cache file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] if the file exists but cannot be read or is
    /// not a JSON object of previews.
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        if !path.exists() {
            log::info!("No preview cache at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, Preview> = serde_json::from_str(&contents)?;
        log::info!(
            "Loaded {} cached previews from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { entries })
    }

    /// Loads the cache, logging and falling back to an empty cache on any
    /// error.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable preview cache {}: {e}", path.display());
            Self::new()
        })
    }

    /// Writes the cache to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PreviewError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        log::info!("Saved {} previews to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Stores the preview for `url`, replacing any previous entry.
    pub fn insert(&mut self, url: String, preview: Preview) {
        self.entries.insert(url, preview);
    }

    /// Returns the cached preview for `url`, if any.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&Preview> {
        self.entries.get(url)
    }

    /// Whether `url` has a cached entry.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreviewLookup for PreviewCache {
    fn lookup(&self, url: &str) -> Preview {
        self.entries.lookup(url)
    }
}

#[cfg(test)]
mod tests {
    use bess_map_preview_models::UNAVAILABLE_TITLE;

    use super::*;

    fn preview(title: &str, url: &str) -> Preview {
        Preview {
            title: title.to_string(),
            description: "desc".to_string(),
            image: String::new(),
            url: url.to_string(),
        }
    }

    #[test]
    fn missing_file_is_empty_cache() {
        let path = std::env::temp_dir().join("bess_map_preview_missing.json");
        let _ = std::fs::remove_file(&path);
        let cache = PreviewCache::load(&path).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = std::env::temp_dir().join("bess_map_preview_cache_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("url_previews.json");

        let mut cache = PreviewCache::new();
        cache.insert(
            "https://example.com/a".to_string(),
            preview("A", "https://example.com/a"),
        );
        cache.save(&path).unwrap();

        let loaded = PreviewCache::load(&path).unwrap();
        assert_eq!(loaded, cache);
        assert_eq!(loaded.lookup("https://example.com/a").title, "A");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let path = std::env::temp_dir().join("bess_map_preview_corrupt.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(PreviewCache::load(&path).is_err());
        assert!(PreviewCache::load_or_empty(&path).is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn lookup_miss_is_unavailable() {
        let cache = PreviewCache::new();
        let miss = cache.lookup("https://nowhere.example");
        assert_eq!(miss.title, UNAVAILABLE_TITLE);
        assert_eq!(miss.url, "https://nowhere.example");
    }
}
