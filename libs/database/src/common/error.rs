use super::classify::ErrorCategory;

/// Unified database error type for all persistence operations.
///
/// Store implementations construct the categorised variants directly
/// (`UniqueViolation`, `NotFound`) so classification never depends on driver
/// message text.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A unique index rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// No row matched the lookup
    #[error("Record not found: {0}")]
    NotFound(String),

    /// PostgreSQL errors (SeaORM) that carry no business meaning
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(sea_orm::DbErr),

    /// The store could not be reached
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The store did not answer in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Migration error
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Every attempt allowed by the retry policy failed
    #[error("operation '{operation}' failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: Box<DatabaseError>,
    },

    /// Generic database error
    #[error("Database error: {0}")]
    Generic(String),
}

impl DatabaseError {
    /// The categorical signature used for retry classification
    pub fn category(&self) -> ErrorCategory {
        match self {
            DatabaseError::UniqueViolation(_) => ErrorCategory::UniqueViolation,
            DatabaseError::NotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Other,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sea_orm::DbErr> for DatabaseError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return DatabaseError::UniqueViolation(detail);
        }

        match err {
            DbErr::RecordNotFound(detail) => DatabaseError::NotFound(detail),
            DbErr::Conn(e) => DatabaseError::ConnectionFailed(e.to_string()),
            DbErr::ConnectionAcquire(e) => DatabaseError::Timeout(e.to_string()),
            other => DatabaseError::Postgres(other),
        }
    }
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
