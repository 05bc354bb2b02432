//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Record still owns dependents and cannot be deleted
    #[error("cannot delete {entity} {id}: it has {count} {dependent}(s)")]
    InUse {
        entity: &'static str,
        id: String,
        dependent: &'static str,
        count: i64,
    },

    /// Input rejected before any write
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Map a unique-constraint violation to `AlreadyExists`, passing other errors through.
    pub(crate) fn from_insert(err: sqlx::Error, entity: &'static str, id: impl ToString) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(err)
    }

    /// True for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// True for uniqueness violations and delete guards.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DatabaseError::AlreadyExists { .. } | DatabaseError::InUse { .. }
        )
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
