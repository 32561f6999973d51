use std::path::PathBuf;

use anyhow::{Context, Result};

/// Bounds for a stress log entry level.
pub const STRESS_LEVEL_MIN: i64 = 1;
pub const STRESS_LEVEL_MAX: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database_path: PathBuf,

    /// Directory holding `<locale>.json` translation catalogs.
    pub translations_dir: PathBuf,

    /// Active locale code (e.g. "en", "fa").
    pub locale: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_path: std::env::var("STRESS_DB_PATH")
                .unwrap_or_else(|_| "data/stress_tracker.db".to_string())
                .into(),
            translations_dir: std::env::var("TRANSLATIONS_DIR")
                .unwrap_or_else(|_| "translations".to_string())
                .into(),
            locale: std::env::var("LOCALE").unwrap_or_else(|_| "en".to_string()),
        };

        if config.locale.is_empty() {
            anyhow::bail!("LOCALE must not be empty");
        }

        Ok(config)
    }

    /// Path of the translation catalog for the active locale.
    pub fn translation_file(&self) -> PathBuf {
        self.translations_dir.join(format!("{}.json", self.locale))
    }

    /// Create the parent directory of the database file if missing.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data dir {}", parent.display()))?;
            }
        }
        Ok(())
    }
}
