//! Repository layer: one data-access object per entity.
//!
//! Every repository implements [`Repository`], a trait parameterized by the
//! entity, its insert shape, its patch shape, and its filter shape. Filters
//! are plain structs enumerating the supported options, never a query
//! language. All operations run inside one scoped transaction via
//! [`crate::db::Database::with_tx`].
//!
//! Listing is always finite and stably ordered (an explicit sort column with
//! id as tie-breaker), so a caller can restart the same query and see the
//! same order.

mod anxiety;
mod exercises;
mod sessions;
mod stress_logs;
mod users;

pub use anxiety::{
    AnxietyQuestionRepository, AnxietyResultFilter, AnxietyResultRepository, QuestionFilter,
};
pub use exercises::{ExerciseFilter, ExerciseRepository};
pub use sessions::{SessionFilter, SessionRepository};
pub use stress_logs::{StressLogFilter, StressLogRepository};
pub use users::{UserFilter, UserRepository};

use crate::error::{Error, Result};

/// CRUD contract each entity repository implements.
pub trait Repository {
    type Entity;
    type New;
    type Patch;
    type Filter;

    /// Entity name used in not-found errors.
    const ENTITY: &'static str;

    /// Insert a validated entity, returning its id. Constraint violations
    /// (duplicate username, occupied question position) fail with a
    /// validation error and leave the store unchanged.
    fn create(&self, new: &Self::New) -> Result<i64>;

    /// Tolerant lookup for callers where absence is an expected outcome.
    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Strict lookup; absence is a not-found error.
    fn get_by_id(&self, id: i64) -> Result<Self::Entity> {
        self.find_by_id(id)?
            .ok_or(Error::not_found(Self::ENTITY, id))
    }

    /// All entities matching `filter`, in a stable order.
    fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Entity>>;

    /// Apply a patch and return the updated entity.
    fn update(&self, id: i64, patch: &Self::Patch) -> Result<Self::Entity>;

    /// Remove an entity. Soft-disable where dependents reference it, hard
    /// delete for leaf entities.
    fn delete(&self, id: i64) -> Result<()>;
}

/// Current timestamp in the storage format (RFC 3339, UTC).
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Map a SQLite constraint violation to a validation error with a
/// caller-supplied message; everything else stays a storage error.
pub(crate) fn map_constraint(e: rusqlite::Error, msg: &str) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::validation(msg)
        }
        other => Error::Storage(other),
    }
}

/// Wrap a domain parse failure so it can cross a `rusqlite` row-mapping
/// closure boundary.
pub(crate) fn column_error(e: Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}
