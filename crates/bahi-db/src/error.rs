//! # Storage Errors
//!
//! [`DbError`] is what every repository call returns. Ledger rule
//! violations travel inside it untouched as [`DbError::Domain`], so callers
//! above the store can still match on the exact `CoreError`.
//!
//! ```text
//!   sqlx::Error ─────┐
//!   MigrateError ────┼──► DbError ──► AssistError (bahi-assist)
//!   CoreError ───────┘      │
//!                           └── Domain(CoreError) unwrapped again upstream
//! ```

use bahi_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup by primary key came back empty.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row. `field` is the constraint's column
    /// list as SQLite reports it, e.g. `inventory.owner_id, inventory.name_key`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The ledger file could not be opened, or the pool was already closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQL ran but SQLite refused it, a CHECK constraint for instance.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN, COMMIT or ROLLBACK itself failed. For a sale this usually
    /// means the write lock was not granted within `busy_timeout`.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every connection stayed checked out past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Insufficient stock, unknown item, duplicate item and friends.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = db_err
                    .message()
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or("unknown")
                    .to_string();
                DbError::UniqueViolation {
                    field,
                    value: "unknown".to_string(),
                }
            }
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("ledger pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
