//! Simple file-based vector store backend.
//!
//! Each table is a pair of files under the store directory:
//! `<table>.meta.json` with the schema and `<table>.jsonl` with one record
//! per line. Search is a linear scan. It is intended for testing and small
//! stores where the overhead of a full vector database is not justified.

use super::super::config::{
    load_table_meta, table_meta_path, write_table_meta, StoreConfig, TableMeta, TABLE_META_SUFFIX,
};
use super::super::traits::{
    SearchHit, TableBackend, TableSchema, VectorMetric, VectorRecord, VectorStoreBackend,
};
use crate::error::{DbError, DbResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Backend name written into table metadata.
const BACKEND_NAME: &str = "simple";

/// Suffix of the JSONL data file.
const DATA_SUFFIX: &str = ".jsonl";

// ============================================================================
// SimpleFileStore
// ============================================================================

/// Simple file-based vector store.
pub struct SimpleFileStore {
    /// Directory holding all table files.
    root: PathBuf,

    /// Distance metric for newly created tables.
    metric: VectorMetric,
}

impl SimpleFileStore {
    /// Open (creating if needed) a store directory.
    pub fn connect(config: &StoreConfig) -> DbResult<Self> {
        debug!("Opening SimpleFileStore at {:?}", config.location);

        fs::create_dir_all(&config.location)
            .map_err(|e| DbError::connect(&config.location, e.to_string()))?;

        if !config.location.is_dir() {
            return Err(DbError::connect(
                &config.location,
                "location is not a directory",
            ));
        }

        Ok(Self {
            root: config.location.clone(),
            metric: config.metric,
        })
    }

    fn data_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}{}", table, DATA_SUFFIX))
    }

    /// Reject names that would escape the store directory.
    fn check_name(name: &str) -> DbResult<()> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(DbError::InvalidTableName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl VectorStoreBackend for SimpleFileStore {
    fn location(&self) -> &Path {
        &self.root
    }

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn table_names(&self) -> DbResult<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| DbError::table_io(&self.root, format!("Failed to list tables: {}", e)))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_string_lossy().strip_suffix(TABLE_META_SUFFIX) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn create_table(&self, name: &str, schema: &TableSchema) -> DbResult<Arc<dyn TableBackend>> {
        Self::check_name(name)?;
        debug!("Creating table '{}' (dimension {})", name, schema.dimension);

        let meta = TableMeta::new(BACKEND_NAME, schema.dimension, self.metric);
        write_table_meta(&self.root, name, &meta)?;

        // Overwrite: truncate any previous rows.
        let data_path = self.data_path(name);
        File::create(&data_path)
            .map_err(|e| DbError::table_io(&data_path, format!("Failed to create table: {}", e)))?;

        Ok(Arc::new(SimpleFileTable {
            name: name.to_string(),
            data_path,
            dimension: schema.dimension,
            metric: meta.metric,
            rows: RwLock::new(Vec::new()),
        }))
    }

    fn open_table(&self, name: &str) -> DbResult<Arc<dyn TableBackend>> {
        Self::check_name(name)?;
        let meta = load_table_meta(&self.root, name)?;
        let data_path = self.data_path(name);

        let table = SimpleFileTable {
            name: name.to_string(),
            data_path,
            dimension: meta.dimension,
            metric: meta.metric,
            rows: RwLock::new(Vec::new()),
        };
        table.load_from_file()?;

        debug!(
            "Opened table '{}' from {:?}",
            name,
            table_meta_path(&self.root, name)
        );
        Ok(Arc::new(table))
    }

    fn close(&self) -> DbResult<()> {
        // Every write is flushed as it happens.
        Ok(())
    }
}

// ============================================================================
// SimpleFileTable
// ============================================================================

/// A table of the simple file store.
///
/// Rows are mirrored in memory; appends go to the end of the JSONL file.
pub struct SimpleFileTable {
    name: String,
    data_path: PathBuf,
    dimension: usize,
    metric: VectorMetric,
    rows: RwLock<Vec<VectorRecord>>,
}

impl SimpleFileTable {
    /// Load rows from the JSONL file, if it exists.
    fn load_from_file(&self) -> DbResult<()> {
        if !self.data_path.exists() {
            return Ok(());
        }
        debug!("Loading rows from {:?}", self.data_path);

        let file = File::open(&self.data_path)?;
        let reader = BufReader::new(file);

        let mut rows = self
            .rows
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<VectorRecord>(&line) {
                Ok(record) => rows.push(record),
                Err(e) => {
                    debug!("Skipping invalid line {}: {}", line_num + 1, e);
                }
            }
        }

        debug!("Loaded {} rows", rows.len());
        Ok(())
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            VectorMetric::L2 => euclidean_distance(a, b),
            VectorMetric::Cosine => 1.0 - cosine_similarity(a, b),
            VectorMetric::Dot => -dot_product(a, b),
        }
    }
}

impl TableBackend for SimpleFileTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DbResult<usize> {
        Ok(self.dimension)
    }

    fn add(&self, records: &[VectorRecord]) -> DbResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!("Adding {} rows to '{}'", records.len(), self.name);

        for record in records {
            if record.vector.len() != self.dimension {
                return Err(DbError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.vector.len(),
                });
            }
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.data_path)
            .map_err(|e| DbError::table_io(&self.data_path, e.to_string()))?;
        file.write_all(buffer.as_bytes())
            .map_err(|e| DbError::table_io(&self.data_path, e.to_string()))?;

        rows.extend_from_slice(records);
        Ok(())
    }

    fn search(&self, vector: &[f32], limit: usize) -> DbResult<Vec<SearchHit>> {
        trace!("Searching '{}', limit={}", self.name, limit);

        if vector.len() != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let rows = self
            .rows
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut scored: Vec<(f32, &VectorRecord)> = rows
            .iter()
            .map(|r| (self.distance(vector, &r.vector), r))
            .collect();

        // Closest first; ties keep insertion order. NaN ranks last.
        scored.sort_by(|a, b| rank_key(a.0).total_cmp(&rank_key(b.0)));

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(limit)
            .map(|(distance, record)| SearchHit::from_record(record.clone(), distance))
            .collect();

        trace!("Found {} hits", hits.len());
        Ok(hits)
    }

    fn count_rows(&self) -> DbResult<usize> {
        let rows = self
            .rows
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(rows.len())
    }
}

// ============================================================================
// Distance Functions
// ============================================================================

/// Sort key for a distance; overflowed (NaN) distances rank after everything.
fn rank_key(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Compute dot product between two vectors.
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute Euclidean (L2) distance between two vectors.
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store(metric: VectorMetric) -> (TempDir, SimpleFileStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::new(temp_dir.path().join("store"))
            .with_backend("simple")
            .with_metric(metric);
        let store = SimpleFileStore::connect(&config).expect("Failed to open store");
        (temp_dir, store)
    }

    #[test]
    fn test_distances() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert!((dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
        assert!((euclidean_distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_create_add_search() {
        let (_temp, store) = create_test_store(VectorMetric::L2);
        let table = store.create_table("docs", &TableSchema::new(3)).unwrap();

        table
            .add(&[
                VectorRecord::new(vec![1.0, 0.0, 0.0]).with_text("a"),
                VectorRecord::new(vec![0.0, 1.0, 0.0]).with_text("b"),
            ])
            .unwrap();

        let hits = table.search(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text.as_deref(), Some("a"));
        assert!(hits[0].distance.abs() < 1e-6);

        let hits = table.search(&[0.0, 0.9, 0.1], 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text.as_deref(), Some("b"));
    }

    #[test]
    fn test_rows_persist_across_open() {
        let (_temp, store) = create_test_store(VectorMetric::Cosine);
        let table = store.create_table("notes", &TableSchema::new(2)).unwrap();
        table
            .add(&[VectorRecord::new(vec![0.5, 0.5]).with_metadata(r#"{"n":1}"#)])
            .unwrap();

        let reopened = store.open_table("notes").unwrap();
        assert_eq!(reopened.count_rows().unwrap(), 1);
        assert_eq!(reopened.dimension().unwrap(), 2);

        let hits = reopened.search(&[0.5, 0.5], 5).unwrap();
        assert_eq!(hits[0].metadata, Some(serde_json::json!({"n": 1})));
    }

    #[test]
    fn test_overflowed_distances_rank_last() {
        let (_temp, store) = create_test_store(VectorMetric::Dot);
        let table = store.create_table("big", &TableSchema::new(2)).unwrap();

        let records: Vec<VectorRecord> = (0..200)
            .map(|i| {
                if i % 3 == 0 {
                    VectorRecord::new(vec![1e30, -1e30]).with_text(format!("r{}", i))
                } else if i == 100 {
                    VectorRecord::new(vec![1.0, 1.0]).with_text("nearest")
                } else {
                    VectorRecord::new(vec![0.5, 0.0]).with_text(format!("r{}", i))
                }
            })
            .collect();
        table.add(&records).unwrap();

        let hits = table.search(&[1e30, 1e30], 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].text.as_deref(), Some("nearest"));
        assert!(hits.iter().all(|h| !h.distance.is_nan()));

        let all = table.search(&[1e30, 1e30], 200).unwrap();
        assert!(all.last().unwrap().distance.is_nan());
    }

    #[test]
    fn test_create_overwrites_existing_table() {
        let (_temp, store) = create_test_store(VectorMetric::L2);
        let table = store.create_table("t", &TableSchema::new(2)).unwrap();
        table.add(&[VectorRecord::new(vec![1.0, 1.0])]).unwrap();

        let recreated = store.create_table("t", &TableSchema::new(4)).unwrap();
        assert_eq!(recreated.count_rows().unwrap(), 0);
        assert_eq!(store.open_table("t").unwrap().dimension().unwrap(), 4);
        assert_eq!(store.table_names().unwrap(), vec!["t".to_string()]);
    }

    #[test]
    fn test_dimension_mismatch_writes_nothing() {
        let (_temp, store) = create_test_store(VectorMetric::L2);
        let table = store.create_table("t", &TableSchema::new(3)).unwrap();

        let err = table
            .add(&[
                VectorRecord::new(vec![1.0, 0.0, 0.0]),
                VectorRecord::new(vec![1.0, 0.0]),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(table.count_rows().unwrap(), 0);
        assert_eq!(store.open_table("t").unwrap().count_rows().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_table() {
        let (_temp, store) = create_test_store(VectorMetric::L2);
        let err = store.open_table("missing").err().unwrap();
        assert!(err.is_table_not_found());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let (_temp, store) = create_test_store(VectorMetric::L2);
        assert!(store.create_table("../escape", &TableSchema::new(2)).is_err());
        assert!(store.open_table("..").is_err());
    }
}
