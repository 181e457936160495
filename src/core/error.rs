//! Error types for the database system
//!
//! This module defines all error types that can occur while binding tables,
//! building statements and executing them.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection error (closed or unusable connection)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Unsupported clause operator
    #[error("Invalid operator: '{0}' (expected AND, OR or ',')")]
    InvalidOperator(String),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// SQLite error, carried unchanged from the engine
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Row or configuration (de)serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create an invalid operator error
    pub fn invalid_operator<S: Into<String>>(op: S) -> Self {
        DatabaseError::InvalidOperator(op.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DatabaseError::InvalidArgument(msg.into())
    }

    /// Create a column not found error
    pub fn column_not_found<S: Into<String>>(column: S) -> Self {
        DatabaseError::ColumnNotFound(column.into())
    }

    /// Create a table not found error
    pub fn table_not_found<S: Into<String>>(table: S) -> Self {
        DatabaseError::TableNotFound(table.into())
    }

    /// Whether the error originated in the storage engine
    pub fn is_storage_error(&self) -> bool {
        matches!(self, DatabaseError::SqliteError(_))
    }
}
