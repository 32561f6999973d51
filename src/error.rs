//! Application error types.
//!
//! Five error kinds cover the whole core: configuration defects (fatal at
//! startup), validation failures, missing entities, storage failures, and
//! authentication rejections. Validation and not-found errors are meant to be
//! surfaced to the user through the translation catalog; storage and
//! configuration errors are logged with full detail and shown only as a
//! generic failure notice.

use thiserror::Error;

use crate::i18n::TranslationCatalog;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed startup resource (translation catalog, config).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied data violates an entity invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found (id {id})")]
    NotFound { entity: &'static str, id: i64 },

    /// Storage-engine failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure on a storage path (backup, restore, export).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential mismatch or disabled account. Deliberately carries no
    /// detail about which part of the credential was wrong.
    #[error("invalid username or password")]
    Authentication,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }

    /// True for errors where a single retry of a read is worth attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }

    /// Render this error as user-facing text in the active locale.
    ///
    /// Validation and not-found errors keep their detail; storage and
    /// configuration errors collapse to a generic notice so internal paths
    /// never reach the screen. The authentication message is identical for
    /// every rejection reason.
    pub fn user_message(&self, catalog: &TranslationCatalog) -> String {
        match self {
            Error::Validation(detail) => {
                format!("{}: {}", catalog.resolve("error.validation"), detail)
            }
            Error::NotFound { .. } => catalog.resolve("error.not_found"),
            Error::Storage(_) | Error::Io(_) => catalog.resolve("error.generic_failure"),
            Error::Configuration(_) => catalog.resolve("error.generic_failure"),
            Error::Authentication => catalog.resolve("error.auth_failed"),
        }
    }
}
