//! Request and response types for gateway operations.
//!
//! Each request type validates itself; the gateway calls `validate()` before
//! touching the store so bad input never reaches the backend.

use serde::{Deserialize, Serialize};

use crate::constants::{
    is_reserved_table_name, DEFAULT_SEARCH_LIMIT, MAX_DIMENSION, MAX_TABLE_NAME_LEN,
};
use crate::errors::{GatewayError, GatewayResult};

pub use lancegate_db::store::SearchHit;

// ============================================================================
// Table names
// ============================================================================

/// Check whether a table name is acceptable.
///
/// Valid names are non-empty, at most [`MAX_TABLE_NAME_LEN`] characters, made
/// of ASCII alphanumerics, `-` and `_`, and start with an alphanumeric
/// character (a leading `_` is reserved for internal tables).
pub fn is_valid_table_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_TABLE_NAME_LEN {
        return false;
    }

    if is_reserved_table_name(name) {
        return false;
    }

    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());

    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a table name, producing a validation error when it is rejected.
pub fn validate_table_name(name: &str) -> GatewayResult<()> {
    if name.is_empty() {
        return Err(GatewayError::validation("Table name must not be empty"));
    }
    if !is_valid_table_name(name) {
        return Err(GatewayError::validation(format!(
            "Invalid table name `{}`: names must start with a letter or digit and contain only \
             letters, digits, hyphens and underscores (max {} chars)",
            name, MAX_TABLE_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_vector(vector: &[f32], what: &str) -> GatewayResult<()> {
    if vector.is_empty() {
        return Err(GatewayError::validation(format!("{} must not be empty", what)));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(GatewayError::validation(format!(
            "{} must contain only finite numbers",
            what
        )));
    }
    Ok(())
}

// ============================================================================
// TableConfig
// ============================================================================

/// Parameters for creating a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Name of the table.
    pub name: String,
    /// Dimension of vectors in the table.
    pub dimension: usize,
}

impl TableConfig {
    /// Create a new table configuration.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }

    /// Check the name and dimension.
    pub fn validate(&self) -> GatewayResult<()> {
        validate_table_name(&self.name)?;
        if self.dimension == 0 {
            return Err(GatewayError::validation(
                "Vector dimension must be positive",
            ));
        }
        if self.dimension > MAX_DIMENSION {
            return Err(GatewayError::validation(format!(
                "Vector dimension {} exceeds the maximum of {}",
                self.dimension, MAX_DIMENSION
            )));
        }
        Ok(())
    }
}

// ============================================================================
// VectorData
// ============================================================================

/// A vector to add to a table, with optional text and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    /// The vector.
    pub vector: Vec<f32>,

    /// Optional text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Optional free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl VectorData {
    /// Create vector data without text or metadata.
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            text: None,
            metadata: None,
        }
    }

    /// Set the text payload.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check that the vector is usable.
    pub fn validate(&self) -> GatewayResult<()> {
        validate_vector(&self.vector, "Vector")
    }

    /// Text to store; empty text is stored as null.
    pub fn stored_text(&self) -> Option<String> {
        self.text.clone().filter(|t| !t.is_empty())
    }

    /// Metadata encoded as a JSON string.
    ///
    /// Absent or empty metadata is stored as null.
    pub fn encoded_metadata(&self) -> GatewayResult<Option<String>> {
        match &self.metadata {
            Some(map) if !map.is_empty() => serde_json::to_string(map)
                .map(Some)
                .map_err(|e| GatewayError::validation(format!("Metadata is not encodable: {}", e))),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// SearchQuery
// ============================================================================

/// A nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query vector.
    pub vector: Vec<f32>,

    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl SearchQuery {
    /// Create a query with the default limit.
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Check the vector and the limit.
    pub fn validate(&self) -> GatewayResult<()> {
        validate_vector(&self.vector, "Query vector")?;
        if self.limit == 0 {
            return Err(GatewayError::validation("Search limit must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Description of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Number of stored records.
    pub rows: usize,
}

/// Snapshot of the gateway's connection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    /// Whether a connection is live.
    pub connected: bool,
    /// Configured store location.
    pub location: String,
    /// Configured backend.
    pub backend: String,
    /// When the current connection was opened (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<String>,
    /// Names of the currently cached table handles, sorted.
    pub cached_tables: Vec<String>,
}
