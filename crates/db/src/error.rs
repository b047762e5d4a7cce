//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The update was based on an older version of the row.
    #[error("workflow was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: i64, actual: i64 },

    /// `(tenant_id, name)` is already taken.
    #[error("a workflow named '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid workflow status: {0}")]
    InvalidStatus(String),
}

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

impl DbError {
    /// Map a unique-constraint failure on insert/update to `DuplicateName`.
    pub(crate) fn from_write(err: sqlx::Error, name: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Self::DuplicateName(name.to_owned())
            }
            _ => Self::Sqlx(err),
        }
    }
}
