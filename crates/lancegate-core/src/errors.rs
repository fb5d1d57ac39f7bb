//! Error types for lancegate-core.

use std::path::PathBuf;

use lancegate_db::DbError;
use thiserror::Error;

/// Which part of the database path failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseErrorKind {
    /// A table operation was attempted without a live connection.
    NotConnected,
    /// The named table is neither cached nor openable.
    TableNotFound,
    /// Connecting to the store failed.
    Connect,
    /// Any other failure reported by the store.
    Backend,
}

impl DatabaseErrorKind {
    /// Short identifier used in logs and JSON responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::TableNotFound => "table_not_found",
            Self::Connect => "connect",
            Self::Backend => "backend",
        }
    }
}

impl std::fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors returned by [`Gateway`](crate::Gateway) operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Caller-supplied data violates a precondition.
    ///
    /// Recoverable by correcting the input; never retried.
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
    },

    /// The store is unreachable, a call into it failed, or a table could
    /// not be resolved.
    #[error("Database error: {message}")]
    Database {
        /// Category of the failure.
        kind: DatabaseErrorKind,
        /// Human-readable description.
        message: String,
        /// Underlying store error, if any.
        #[source]
        source: Option<DbError>,
    },
}

impl GatewayError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a database error without an underlying cause.
    pub fn database(kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        Self::Database {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error wrapping a store error.
    ///
    /// The store's message is appended so it survives even when only the
    /// top-level `Display` is shown.
    pub fn from_db(kind: DatabaseErrorKind, context: impl Into<String>, source: DbError) -> Self {
        Self::Database {
            kind,
            message: format!("{}: {}", context.into(), source),
            source: Some(source),
        }
    }

    /// Error for table operations without a live connection.
    pub fn not_connected() -> Self {
        Self::database(DatabaseErrorKind::NotConnected, "not connected")
    }

    /// Error for a vector whose length differs from the table dimension.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::validation(format!(
            "Vector dimension mismatch: expected {}, got {}",
            expected, actual
        ))
    }

    /// Whether this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// The database error kind, if this is a database error.
    pub fn database_kind(&self) -> Option<DatabaseErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::Validation { .. } => None,
        }
    }

    /// HTTP-equivalent status code for transports.
    ///
    /// Validation maps to 400, missing tables to 404, everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Database {
                kind: DatabaseErrorKind::TableNotFound,
                ..
            } => 404,
            Self::Database { .. } => 500,
        }
    }
}

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {message}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    Invalid {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },
}
