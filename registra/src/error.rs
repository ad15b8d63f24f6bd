//! Error types for the repository and service layers

use std::fmt;
use thiserror::Error;

/// SQLSTATE code Postgres reports for unique constraint violations
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE code Postgres reports for foreign key violations
pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

// ============================================================================
// Structured Database Errors
// ============================================================================

/// Database operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseOperation {
    /// Establishing a database connection
    Connect,
    /// Executing a query
    Query,
    /// Inserting records
    Insert,
    /// Updating records
    Update,
    /// Deleting records
    Delete,
    /// Transaction operations (begin, commit, rollback)
    Transaction,
    /// Acquiring a connection from the pool
    PoolAcquire,
}

impl fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Query => write!(f, "query"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Transaction => write!(f, "transaction"),
            Self::PoolAcquire => write!(f, "pool_acquire"),
        }
    }
}

/// Category of database error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseErrorKind {
    /// Failed to establish connection
    ConnectionFailed,
    /// Record not found
    NotFound,
    /// Constraint violation (unique, foreign key, check)
    ConstraintViolation,
    /// Query execution failed
    QueryFailed,
    /// Transaction failed (begin, commit, or rollback)
    TransactionFailed,
    /// Type conversion error
    TypeConversion,
    /// Configuration error
    Configuration,
    /// Operation timed out
    Timeout,
    /// Connection pool exhausted
    PoolExhausted,
    /// Other/unknown error
    Other,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::TransactionFailed => write!(f, "transaction_failed"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Configuration => write!(f, "configuration"),
            Self::Timeout => write!(f, "timeout"),
            Self::PoolExhausted => write!(f, "pool_exhausted"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured database error with operation context
///
/// The repository layer surfaces these unclassified; services inspect the
/// captured SQLSTATE to decide whether a write failed on a duplicate or a
/// missing referenced row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    /// The operation being performed when the error occurred
    pub operation: DatabaseOperation,
    /// The category of error
    pub kind: DatabaseErrorKind,
    /// Human-readable error message
    pub message: String,
    /// SQLSTATE code reported by Postgres, when available
    pub sqlstate: Option<String>,
    /// Additional context (e.g., table name, query fragment)
    pub context: Option<String>,
}

impl DatabaseError {
    /// Create a new database error
    pub fn new(
        operation: DatabaseOperation,
        kind: DatabaseErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            sqlstate: None,
            context: None,
        }
    }

    /// Create a "not found" error
    pub fn not_found(operation: DatabaseOperation, message: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::NotFound, message)
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::Connect,
            DatabaseErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a constraint violation error carrying its SQLSTATE
    pub fn constraint_violation(
        operation: DatabaseOperation,
        message: impl Into<String>,
        sqlstate: Option<String>,
    ) -> Self {
        let mut err = Self::new(operation, DatabaseErrorKind::ConstraintViolation, message);
        err.sqlstate = sqlstate;
        err
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::Query,
            DatabaseErrorKind::QueryFailed,
            message,
        )
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::PoolAcquire,
            DatabaseErrorKind::PoolExhausted,
            message,
        )
    }

    /// Create a transaction failed error
    pub fn transaction_failed(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::Transaction,
            DatabaseErrorKind::TransactionFailed,
            message,
        )
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            DatabaseErrorKind::ConnectionFailed
                | DatabaseErrorKind::Timeout
                | DatabaseErrorKind::PoolExhausted
        )
    }

    /// True when the underlying failure was a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate.as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION)
    }

    /// True when the underlying failure was a foreign key violation
    pub fn is_foreign_key_violation(&self) -> bool {
        self.sqlstate.as_deref() == Some(SQLSTATE_FOREIGN_KEY_VIOLATION)
    }

    /// Add context to an existing error
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref ctx) = self.context {
            write!(f, " [context: {}]", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for DatabaseError {}

// Conversion from sqlx::Error to DatabaseError
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::RowNotFound => Self::not_found(DatabaseOperation::Query, "Row not found"),
            E::PoolTimedOut => Self::pool_exhausted("Connection pool timed out"),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::Protocol(msg) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::QueryFailed,
                msg,
            ),
            E::Configuration(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::Configuration,
                e.to_string(),
            ),
            E::Io(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::ConnectionFailed,
                e.to_string(),
            ),
            E::Tls(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::ConnectionFailed,
                format!("TLS error: {}", e),
            ),
            E::TypeNotFound { type_name } => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::TypeConversion,
                format!("Type not found: {}", type_name),
            ),
            E::ColumnNotFound(col) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::QueryFailed,
                format!("Column not found: {}", col),
            ),
            E::ColumnIndexOutOfBounds { index, len } => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::QueryFailed,
                format!("Column index {} out of bounds (len: {})", index, len),
            ),
            E::ColumnDecode { index, source } => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::TypeConversion,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::TypeConversion,
                e.to_string(),
            ),
            E::Database(db_err) => {
                let sqlstate = db_err.code().map(|c| c.to_string());
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    Self::constraint_violation(
                        DatabaseOperation::Query,
                        db_err.to_string(),
                        sqlstate,
                    )
                } else {
                    let mut err = Self::new(
                        DatabaseOperation::Query,
                        DatabaseErrorKind::QueryFailed,
                        db_err.to_string(),
                    );
                    err.sqlstate = sqlstate;
                    err
                }
            }
            E::WorkerCrashed => Self::connection_failed("Database worker crashed"),
            _ => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::Other,
                err.to_string(),
            ),
        }
    }
}

/// Result type alias used throughout the repository layer
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service layer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Structured database error with operation context
    #[error("{0}")]
    Database(DatabaseError),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write
    #[error("Duplicate data: {0} already exists")]
    Duplicate(String),

    /// A referenced row does not exist
    #[error("Dependency error: referenced {0} does not exist")]
    Dependency(String),

    /// Input rejected before reaching storage
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a write failure the way services report it: unique
    /// violations become [`Error::Duplicate`] for `entity`, foreign key
    /// violations become [`Error::Dependency`] for `reference`, and
    /// everything else is surfaced unchanged.
    pub fn from_write(err: DatabaseError, entity: &str, reference: &str) -> Self {
        if err.is_unique_violation() {
            Error::Duplicate(entity.to_string())
        } else if err.is_foreign_key_violation() {
            Error::Dependency(reference.to_string())
        } else {
            Error::Database(err)
        }
    }
}

// Manual From implementation for the boxed config error
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<DatabaseError> for Error {
    fn from(err: DatabaseError) -> Self {
        Error::Database(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(DatabaseError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_new() {
        let err = DatabaseError::new(
            DatabaseOperation::Query,
            DatabaseErrorKind::QueryFailed,
            "Query failed",
        );
        assert_eq!(err.operation, DatabaseOperation::Query);
        assert_eq!(err.kind, DatabaseErrorKind::QueryFailed);
        assert_eq!(err.message, "Query failed");
        assert!(err.sqlstate.is_none());
        assert!(err.context.is_none());
    }

    #[test]
    fn test_constraint_violation_carries_sqlstate() {
        let err = DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "duplicate key value violates unique constraint",
            Some(SQLSTATE_UNIQUE_VIOLATION.to_string()),
        );
        assert_eq!(err.kind, DatabaseErrorKind::ConstraintViolation);
        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_foreign_key_violation_detection() {
        let err = DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "violates foreign key constraint",
            Some(SQLSTATE_FOREIGN_KEY_VIOLATION.to_string()),
        );
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_constraint_without_sqlstate_is_neither() {
        let err = DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "check constraint failed",
            None,
        );
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_is_retriable_transient_errors() {
        assert!(DatabaseError::connection_failed("refused").is_retriable());
        assert!(DatabaseError::pool_exhausted("exhausted").is_retriable());
        assert!(DatabaseError::new(
            DatabaseOperation::Query,
            DatabaseErrorKind::Timeout,
            "timeout"
        )
        .is_retriable());
    }

    #[test]
    fn test_is_retriable_permanent_errors() {
        assert!(!DatabaseError::not_found(DatabaseOperation::Query, "not found").is_retriable());
        assert!(!DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "unique",
            Some(SQLSTATE_UNIQUE_VIOLATION.to_string())
        )
        .is_retriable());
        assert!(!DatabaseError::query_failed("syntax error").is_retriable());
        assert!(!DatabaseError::transaction_failed("rollback").is_retriable());
    }

    #[test]
    fn test_display_formatting() {
        let err = DatabaseError::new(
            DatabaseOperation::Query,
            DatabaseErrorKind::QueryFailed,
            "Syntax error near 'FROM'",
        );
        let display = format!("{}", err);
        assert!(display.contains("query_failed"));
        assert!(display.contains("query"));
        assert!(display.contains("Syntax error near 'FROM'"));
    }

    #[test]
    fn test_display_formatting_with_context() {
        let err = DatabaseError::query_failed("Query failed").add_context("school");
        let display = format!("{}", err);
        assert!(display.contains("[context: school]"));
    }

    #[test]
    fn test_from_write_unique_violation() {
        let db = DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "duplicate key",
            Some(SQLSTATE_UNIQUE_VIOLATION.to_string()),
        );
        let err = Error::from_write(db, "school", "faculty");
        assert!(matches!(err, Error::Duplicate(ref e) if e == "school"));
        assert_eq!(err.to_string(), "Duplicate data: school already exists");
    }

    #[test]
    fn test_from_write_foreign_key_violation() {
        let db = DatabaseError::constraint_violation(
            DatabaseOperation::Insert,
            "fk violated",
            Some(SQLSTATE_FOREIGN_KEY_VIOLATION.to_string()),
        );
        let err = Error::from_write(db, "faculty", "school");
        assert!(matches!(err, Error::Dependency(ref r) if r == "school"));
        assert_eq!(
            err.to_string(),
            "Dependency error: referenced school does not exist"
        );
    }

    #[test]
    fn test_from_write_passes_other_errors_through() {
        let db = DatabaseError::query_failed("syntax error");
        let err = Error::from_write(db.clone(), "school", "faculty");
        match err {
            Error::Database(inner) => assert_eq!(inner, db),
            other => panic!("expected Database, got {:?}", other),
        }
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind, DatabaseErrorKind::NotFound);
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("course offering".to_string());
        assert_eq!(err.to_string(), "Not found: course offering");
    }
}
