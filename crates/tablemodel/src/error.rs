//! Error types for tablemodel

use thiserror::Error;

/// Result type alias for tablemodel operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for record and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// An operation needed a live connection (or its dialect) and none was available
    #[error("No database connection setup")]
    NoConnection,

    /// Attribute access on a name that is not a column of the table
    #[error("Unknown field '{field}' on table '{table}'")]
    UnknownField { table: String, field: String },

    /// Attribute read before any attribute was ever set
    #[error("data property={0} has not been initialised")]
    NotInitialized(String),

    /// Dynamic dispatch could not parse the requested call
    #[error("No such operation [{0}]")]
    UnknownOperation(String),

    /// Validation hook rejected the pending data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Column discovery returned nothing for the table
    #[error("Table '{0}' has no columns or does not exist")]
    NoSuchTable(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Connection setup error
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create an unknown field error
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    /// Check if this error came from the driver rather than from this crate
    pub fn is_driver_error(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => true,
            #[cfg(feature = "postgres")]
            Self::Query(_) => true,
            _ => false,
        }
    }

    /// Check if the driver reported a unique constraint violation.
    ///
    /// The driver error itself is left untouched; this only inspects it.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            #[cfg(feature = "postgres")]
            Self::Query(err) => err
                .as_db_error()
                .is_some_and(|db_err| db_err.code().code() == "23505"),
            _ => false,
        }
    }
}
