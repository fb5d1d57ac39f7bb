//! Error types for lancegate-db.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lancegate-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in lancegate-db operations.
#[derive(Debug, Error)]
pub enum DbError {
    // ========================================================================
    // Connection errors
    // ========================================================================
    /// Failed to open a store at the given location.
    #[error("Failed to connect to store at {location}: {message}")]
    Connect { location: PathBuf, message: String },

    /// The requested backend is not compiled in or does not exist.
    #[error("Unknown backend: '{backend}'. Available backends: {available}")]
    UnknownBackend { backend: String, available: String },

    // ========================================================================
    // Table errors
    // ========================================================================
    /// The named table does not exist in the store.
    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    /// The table name cannot be used by this backend.
    #[error("Invalid table name '{name}'")]
    InvalidTableName { name: String },

    /// Table I/O error.
    #[error("Table I/O error at {path}: {message}")]
    TableIo { path: PathBuf, message: String },

    /// Table data parse error.
    #[error("Table parse error at {path}: {message}")]
    TableParse { path: PathBuf, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The requested dimension cannot be represented by the backend.
    #[error("Unsupported vector dimension {dimension}")]
    InvalidDimension { dimension: usize },

    /// LanceDB error.
    #[cfg(feature = "lancedb")]
    #[error("LanceDB error: {message}")]
    LanceDb { message: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connect error.
    pub fn connect(location: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Connect {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a table-not-found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Create a table I/O error.
    pub fn table_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TableIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a table parse error.
    pub fn table_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TableParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error reports a missing table.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }
}

#[cfg(feature = "lancedb")]
impl From<lancedb::Error> for DbError {
    fn from(err: lancedb::Error) -> Self {
        match err {
            lancedb::Error::TableNotFound { name, .. } => Self::TableNotFound { name },
            other => Self::LanceDb {
                message: other.to_string(),
            },
        }
    }
}
