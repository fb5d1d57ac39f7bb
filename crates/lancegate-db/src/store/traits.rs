//! Vector store traits and core types.
//!
//! This module defines the two abstractions every storage backend provides:
//! a connection-level [`VectorStoreBackend`] and the per-table
//! [`TableBackend`] handles it hands out.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// VectorMetric
// ============================================================================

/// Distance metric for vector similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    /// Euclidean (L2) distance (default).
    #[default]
    L2,
    /// Cosine distance.
    Cosine,
    /// Dot product.
    Dot,
}

impl VectorMetric {
    /// Get the metric name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMetric::L2 => "l2",
            VectorMetric::Cosine => "cosine",
            VectorMetric::Dot => "dot",
        }
    }
}

impl std::fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VectorMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            _ => Err(format!(
                "Unknown distance metric: '{}'. Use 'l2', 'cosine', or 'dot'.",
                s
            )),
        }
    }
}

// ============================================================================
// TableSchema
// ============================================================================

/// Layout of a vector table.
///
/// Every table has a fixed-width `vector` column of `dimension` floats, a
/// nullable `text` column and a nullable `metadata` column holding a JSON
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Number of components in every stored vector.
    pub dimension: usize,
}

impl TableSchema {
    /// Create a schema for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

// ============================================================================
// VectorRecord
// ============================================================================

/// A single row to append to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// The embedding vector.
    pub vector: Vec<f32>,

    /// Optional text payload.
    #[serde(default)]
    pub text: Option<String>,

    /// Optional metadata, already encoded as a JSON string.
    #[serde(default)]
    pub metadata: Option<String>,
}

impl VectorRecord {
    /// Create a record with only a vector.
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

    /// Set the JSON-encoded metadata.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

// ============================================================================
// SearchHit
// ============================================================================

/// A single result from a nearest-neighbour search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored vector.
    pub vector: Vec<f32>,

    /// Text payload stored with the vector.
    pub text: Option<String>,

    /// Decoded metadata stored with the vector.
    pub metadata: Option<serde_json::Value>,

    /// Distance to the query vector (lower is closer).
    pub distance: f32,
}

impl SearchHit {
    /// Build a hit from a stored record and its distance.
    ///
    /// Metadata that is not valid JSON is surfaced as a JSON string rather
    /// than dropped.
    pub fn from_record(record: VectorRecord, distance: f32) -> Self {
        let metadata = record.metadata.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        });
        Self {
            vector: record.vector,
            text: record.text,
            metadata,
            distance,
        }
    }
}

// ============================================================================
// Backend Traits
// ============================================================================

/// An opened table inside a vector store.
///
/// Handles are cheap to clone behind an `Arc` and stay valid for the
/// lifetime of the connection that produced them.
pub trait TableBackend: Send + Sync {
    /// Name of the table.
    fn name(&self) -> &str;

    /// Dimension of the `vector` column.
    fn dimension(&self) -> DbResult<usize>;

    /// Append records to the table.
    ///
    /// Every record must match the table dimension; a mismatch fails the
    /// whole call before anything is written.
    fn add(&self, records: &[VectorRecord]) -> DbResult<()>;

    /// Return up to `limit` records closest to `vector`, closest first.
    fn search(&self, vector: &[f32], limit: usize) -> DbResult<Vec<SearchHit>>;

    /// Number of rows in the table.
    fn count_rows(&self) -> DbResult<usize>;
}

/// A live connection to a vector store.
///
/// ## Implementation Notes
///
/// - `create_table` replaces any existing table with the same name.
/// - `open_table` fails with [`DbError::TableNotFound`](crate::DbError::TableNotFound)
///   when the table does not exist.
pub trait VectorStoreBackend: Send + Sync {
    /// Location the store persists to.
    fn location(&self) -> &Path;

    /// Backend identifier (e.g. "lancedb").
    fn backend_name(&self) -> &'static str;

    /// Names of all tables in the store.
    fn table_names(&self) -> DbResult<Vec<String>>;

    /// Create (or overwrite) a table.
    fn create_table(&self, name: &str, schema: &TableSchema) -> DbResult<Arc<dyn TableBackend>>;

    /// Open an existing table.
    fn open_table(&self, name: &str) -> DbResult<Arc<dyn TableBackend>>;

    /// Release the connection.
    fn close(&self) -> DbResult<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_metric() {
        assert_eq!(VectorMetric::L2.as_str(), "l2");
        assert_eq!(VectorMetric::Cosine.as_str(), "cosine");
        assert_eq!(VectorMetric::Dot.as_str(), "dot");
        assert_eq!(VectorMetric::default(), VectorMetric::L2);
        assert_eq!("COSINE".parse::<VectorMetric>(), Ok(VectorMetric::Cosine));
        assert!("manhattan".parse::<VectorMetric>().is_err());
    }

    #[test]
    fn test_vector_record_builder() {
        let record = VectorRecord::new(vec![1.0, 2.0, 3.0])
            .with_text("hello")
            .with_metadata(r#"{"k":"v"}"#);

        assert_eq!(record.vector.len(), 3);
        assert_eq!(record.text.as_deref(), Some("hello"));
        assert_eq!(record.metadata.as_deref(), Some(r#"{"k":"v"}"#));
    }

    #[test]
    fn test_search_hit_decodes_metadata() {
        let hit = SearchHit::from_record(
            VectorRecord::new(vec![0.0]).with_metadata(r#"{"source":"unit"}"#),
            0.5,
        );
        assert_eq!(hit.metadata, Some(serde_json::json!({"source": "unit"})));

        let raw = SearchHit::from_record(VectorRecord::new(vec![0.0]).with_metadata("plain"), 0.0);
        assert_eq!(raw.metadata, Some(serde_json::json!("plain")));
    }
}
