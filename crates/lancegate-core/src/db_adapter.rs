//! Adapter layer for lancegate-db.
//!
//! Maps store errors onto the gateway's two-variant error taxonomy so the
//! rest of the crate only ever deals with [`GatewayError`].
//!
//! ```text
//! gateway (connect, add_vector, search_vectors, ...)
//!        ↓
//!   db_adapter (this module) - error classification
//!        ↓
//!     lancegate-db backends (LanceDB, simple file store)
//! ```

use lancegate_db::{DbError, DbResult};

use crate::errors::{DatabaseErrorKind, GatewayError};

/// Convert a store error into a gateway error.
///
/// Dimension mismatches are caller mistakes and become validation errors.
/// Missing tables keep their own kind so transports can report them apart
/// from generic failures.
pub fn from_db_error(context: impl Into<String>, err: DbError) -> GatewayError {
    match err {
        DbError::DimensionMismatch { expected, actual } => {
            GatewayError::dimension_mismatch(expected, actual)
        }
        DbError::InvalidTableName { name } => {
            GatewayError::validation(format!("Invalid table name `{}`", name))
        }
        DbError::InvalidDimension { dimension } => {
            GatewayError::validation(format!("Unsupported dimension {}", dimension))
        }
        DbError::TableNotFound { .. } => {
            GatewayError::from_db(DatabaseErrorKind::TableNotFound, context, err)
        }
        DbError::Connect { .. } | DbError::UnknownBackend { .. } => {
            GatewayError::from_db(DatabaseErrorKind::Connect, context, err)
        }
        other => GatewayError::from_db(DatabaseErrorKind::Backend, context, other),
    }
}

/// Extension trait to convert `DbResult` into a gateway result.
pub trait IntoGatewayResult<T> {
    /// Convert, prefixing any error message with `context`.
    fn into_gateway_result(self, context: impl Into<String>) -> Result<T, GatewayError>;
}

impl<T> IntoGatewayResult<T> for DbResult<T> {
    fn into_gateway_result(self, context: impl Into<String>) -> Result<T, GatewayError> {
        self.map_err(|e| from_db_error(context, e))
    }
}
