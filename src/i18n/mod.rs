//! Localization module.
//!
//! All user-facing text comes out of a translation catalog loaded once at
//! process start. The catalog is a flat key→string mapping read from a JSON
//! file; after loading it is immutable and can be passed by reference to
//! every component that renders text.
//!
//! - `catalog`: loading and key resolution with a visible fallback
//! - `validator`: startup check that the shipped catalog covers every key
//!   the application references
//!
//! This is intentionally not a general i18n engine: no pluralization, no
//! interpolation. Scope matches the single locale the application ships.

mod catalog;
mod validator;

pub use catalog::TranslationCatalog;
pub use validator::{CatalogValidator, ValidationReport, REQUIRED_KEYS};
