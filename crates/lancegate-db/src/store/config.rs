//! Store configuration and per-table metadata.

use super::traits::VectorMetric;
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Default backend name.
pub const DEFAULT_BACKEND: &str = "lancedb";

/// Suffix of the per-table metadata file written by file-based backends.
pub const TABLE_META_SUFFIX: &str = ".meta.json";

// ============================================================================
// StoreConfig
// ============================================================================

/// Configuration for opening a vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory (or URI) the store persists to.
    pub location: PathBuf,

    /// Backend to use (e.g., "lancedb", "simple").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Distance metric for similarity search.
    #[serde(default)]
    pub metric: VectorMetric,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl StoreConfig {
    /// Create a new config for the given location.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            backend: DEFAULT_BACKEND.to_string(),
            metric: VectorMetric::default(),
        }
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = metric;
        self
    }
}

// ============================================================================
// TableMeta
// ============================================================================

/// Metadata persisted next to a table by file-based backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    /// Backend that wrote this table.
    pub backend: String,

    /// Dimension of vectors.
    pub dimension: usize,

    /// Distance metric the table was created with.
    pub metric: VectorMetric,

    /// Schema version for future migrations.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

impl TableMeta {
    /// Create new metadata stamped with the current time.
    pub fn new(backend: impl Into<String>, dimension: usize, metric: VectorMetric) -> Self {
        Self {
            backend: backend.into(),
            dimension,
            metric,
            schema_version: 1,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Path of the metadata file for `table` under `root`.
pub fn table_meta_path(root: &Path, table: &str) -> PathBuf {
    root.join(format!("{}{}", table, TABLE_META_SUFFIX))
}

/// Load table metadata.
pub fn load_table_meta(root: &Path, table: &str) -> DbResult<TableMeta> {
    let meta_path = table_meta_path(root, table);
    debug!("Loading table metadata from {:?}", meta_path);

    let content = fs::read_to_string(&meta_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DbError::table_not_found(table)
        } else {
            DbError::table_io(&meta_path, format!("Failed to read table metadata: {}", e))
        }
    })?;

    serde_json::from_str(&content).map_err(|e| {
        DbError::table_parse(meta_path, format!("Failed to parse table metadata: {}", e))
    })
}

/// Write table metadata, creating `root` if needed.
pub fn write_table_meta(root: &Path, table: &str, meta: &TableMeta) -> DbResult<()> {
    let meta_path = table_meta_path(root, table);
    debug!("Writing table metadata to {:?}", meta_path);

    if !root.exists() {
        fs::create_dir_all(root)?;
    }

    let content = serde_json::to_string_pretty(meta)?;
    fs::write(&meta_path, content)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
