use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Key→text mapping for one locale.
///
/// Loaded once at startup from a JSON file and read-only afterwards. All
/// fields are immutable post-load, so a shared reference is safe to hand to
/// any number of components without synchronization.
#[derive(Debug, Clone)]
pub struct TranslationCatalog {
    locale: String,
    entries: HashMap<String, String>,
}

impl TranslationCatalog {
    /// Load a catalog from a JSON file containing a flat string map.
    ///
    /// A missing or malformed file is a configuration defect: the
    /// application must not start with an empty UI, so this fails loudly
    /// instead of defaulting to an empty mapping.
    pub fn load(path: &Path) -> Result<Self> {
        let locale = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "translation file not found: {} ({})",
                path.display(),
                e
            ))
        })?;

        let entries: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            Error::Configuration(format!(
                "invalid translation file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            locale = %locale,
            keys = entries.len(),
            "Loaded translation catalog"
        );

        Ok(Self { locale, entries })
    }

    /// Build a catalog directly from key/value pairs. Used by tests and by
    /// callers that embed their strings.
    pub fn from_entries<K, V>(locale: &str, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            locale: locale.to_string(),
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Resolve a key to its localized text.
    ///
    /// A missing key degrades visibly: the bracketed key itself is returned
    /// so the gap shows up on screen instead of crashing the caller or
    /// rendering an empty string.
    pub fn resolve(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(text) => text.clone(),
            None => format!("[{}]", key),
        }
    }

    /// Resolve a key, falling back to a caller-supplied default.
    pub fn resolve_or(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
