//! Translation catalog validation.
//!
//! Every key the application references must exist in the shipped catalog.
//! A missing key is a configuration defect caught at startup, not a runtime
//! error hidden behind the `[key]` fallback.

use super::TranslationCatalog;

/// Keys the application references. The startup check fails when any of
/// these is absent from the active catalog.
pub const REQUIRED_KEYS: &[&str] = &[
    "app.title",
    "app.ready",
    "admin.title",
    "login.title",
    "login.username",
    "login.password",
    "error.validation",
    "error.not_found",
    "error.generic_failure",
    "error.auth_failed",
    "stress.level",
    "stress.notes",
    "stress.sleep_hours",
    "stress.physical_activity",
    "exercise.breathing",
    "exercise.meditation",
    "exercise.guided_relaxation",
    "exercise.music",
    "anxiety.test_title",
    "anxiety.severity.minimal",
    "anxiety.severity.mild",
    "anxiety.severity.moderate",
    "anxiety.severity.severe",
];

/// Result of validating a catalog against a required key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Required keys absent from the catalog.
    pub errors: Vec<String>,

    /// Keys present but mapped to blank text.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CatalogValidator;

impl CatalogValidator {
    /// Check that `catalog` defines every key in `required`.
    ///
    /// Missing keys are errors; keys mapped to empty or whitespace-only text
    /// are warnings (the UI would render a blank label).
    pub fn validate(catalog: &TranslationCatalog, required: &[&str]) -> ValidationReport {
        let mut report = ValidationReport::new();

        for key in required {
            if !catalog.contains(key) {
                report.errors.push(format!(
                    "missing translation key '{}' in locale '{}'",
                    key,
                    catalog.locale()
                ));
            } else if catalog.resolve(key).trim().is_empty() {
                report
                    .warnings
                    .push(format!("translation key '{}' has blank text", key));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_catalog_is_clean() {
        let catalog =
            TranslationCatalog::from_entries("en", [("a", "text a"), ("b", "text b")]);
        let report = CatalogValidator::validate(&catalog, &["a", "b"]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_key_is_error() {
        let catalog = TranslationCatalog::from_entries("en", [("a", "text a")]);
        let report = CatalogValidator::validate(&catalog, &["a", "b"]);
        assert!(report.has_errors());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("'b'"));
    }

    #[test]
    fn test_blank_value_is_warning() {
        let catalog = TranslationCatalog::from_entries("en", [("a", "  ")]);
        let report = CatalogValidator::validate(&catalog, &["a"]);
        assert!(!report.has_errors());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_required_keys_have_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for key in REQUIRED_KEYS {
            assert!(seen.insert(key), "duplicate required key {}", key);
        }
    }
}
