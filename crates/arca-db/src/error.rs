//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//!
//! SQLite error (sqlx::Error)
//!      |
//!      v
//! DbError (this module) - adds context and categorization, and carries
//!      |                  domain errors raised inside a transaction
//!      v
//! Request layer maps `ErrorKind` to a transport status (out of scope)

use thiserror::Error;

use arca_core::{CoreError, ErrorKind};

/// Database operation errors.
///
/// Engine operations return this single type: storage failures wrap the
/// sqlx error, while business rule violations detected inside a
/// transaction surface as [`DbError::Domain`].
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation (stock, balance, status,
    /// validation). The transaction was rolled back in full.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate product code
    /// - A second credit for the same sale
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Stable machine-readable kind for the request layer.
    ///
    /// Storage-level failures all map to `Conflict`-free internals the
    /// transport reports as a server error; only domain errors and
    /// missing rows carry a client-facing kind.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DbError::Domain(core) => Some(core.kind()),
            DbError::NotFound { .. } => Some(ErrorKind::NotFound),
            DbError::UniqueViolation { .. } => Some(ErrorKind::Conflict),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
///
/// sqlx::Error::RowNotFound   -> DbError::NotFound
/// sqlx::Error::Database      -> analyze message for constraint type
/// sqlx::Error::PoolTimedOut  -> DbError::PoolExhausted
/// other                      -> DbError::Internal
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
