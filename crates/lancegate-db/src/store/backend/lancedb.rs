//! LanceDB vector store backend.
//!
//! This backend provides production-ready vector search using LanceDB. The
//! client is async; every call is driven to completion on a private tokio
//! runtime owned by the connection and shared with its tables.

use super::super::config::StoreConfig;
use super::super::traits::{
    SearchHit, TableBackend, TableSchema, VectorMetric, VectorRecord, VectorStoreBackend,
};
use crate::error::{DbError, DbResult};
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::database::CreateTableMode;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, trace};

/// Column holding the fixed-size vector.
const VECTOR_COLUMN: &str = "vector";

/// Column holding the optional text payload.
const TEXT_COLUMN: &str = "text";

/// Column holding the optional JSON metadata.
const METADATA_COLUMN: &str = "metadata";

/// Column LanceDB adds to search results.
const DISTANCE_COLUMN: &str = "_distance";

// ============================================================================
// LanceDbStore
// ============================================================================

/// LanceDB connection.
pub struct LanceDbStore {
    /// Path or URI of the database.
    location: PathBuf,

    /// Distance metric used for searches.
    metric: VectorMetric,

    /// LanceDB connection.
    connection: Connection,

    /// Tokio runtime for async operations.
    runtime: Arc<Runtime>,
}

impl LanceDbStore {
    /// Connect to a LanceDB database.
    pub fn connect(config: &StoreConfig) -> DbResult<Self> {
        debug!("Connecting LanceDbStore at {:?}", config.location);

        let runtime = Runtime::new()
            .map_err(|e| DbError::internal(format!("Failed to create runtime: {}", e)))?;

        let uri = config.location.to_string_lossy().to_string();
        let connection = runtime
            .block_on(async { connect(&uri).execute().await })
            .map_err(|e| DbError::connect(&config.location, e.to_string()))?;

        Ok(Self {
            location: config.location.clone(),
            metric: config.metric,
            connection,
            runtime: Arc::new(runtime),
        })
    }

    /// Arrow schema for a table of the given dimension.
    fn create_schema(dimension: usize) -> DbResult<Schema> {
        let width = list_width(dimension)?;
        Ok(Schema::new(vec![
            Field::new(
                VECTOR_COLUMN,
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), width),
                false,
            ),
            Field::new(TEXT_COLUMN, DataType::Utf8, true),
            Field::new(METADATA_COLUMN, DataType::Utf8, true), // JSON string
        ]))
    }

    fn wrap_table(&self, table: Table) -> Arc<dyn TableBackend> {
        Arc::new(LanceDbTable {
            table,
            metric: self.metric,
            runtime: Arc::clone(&self.runtime),
        })
    }
}

impl VectorStoreBackend for LanceDbStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn backend_name(&self) -> &'static str {
        "lancedb"
    }

    fn table_names(&self) -> DbResult<Vec<String>> {
        self.runtime
            .block_on(async { self.connection.table_names().execute().await })
            .map_err(|e| DbError::LanceDb {
                message: format!("Failed to list tables: {}", e),
            })
    }

    fn create_table(&self, name: &str, schema: &TableSchema) -> DbResult<Arc<dyn TableBackend>> {
        debug!("Creating table '{}' (dimension {})", name, schema.dimension);

        let arrow_schema = Arc::new(Self::create_schema(schema.dimension)?);
        let table = self
            .runtime
            .block_on(async {
                self.connection
                    .create_empty_table(name, arrow_schema)
                    .mode(CreateTableMode::Overwrite)
                    .execute()
                    .await
            })
            .map_err(|e| DbError::LanceDb {
                message: format!("Failed to create table '{}': {}", name, e),
            })?;

        Ok(self.wrap_table(table))
    }

    fn open_table(&self, name: &str) -> DbResult<Arc<dyn TableBackend>> {
        debug!("Opening table '{}'", name);

        let table = self
            .runtime
            .block_on(async { self.connection.open_table(name).execute().await })
            .map_err(DbError::from)?;

        Ok(self.wrap_table(table))
    }

    fn close(&self) -> DbResult<()> {
        // The connection holds no open files; dropping it is enough.
        Ok(())
    }
}

// ============================================================================
// LanceDbTable
// ============================================================================

/// An opened LanceDB table.
pub struct LanceDbTable {
    table: Table,
    metric: VectorMetric,
    runtime: Arc<Runtime>,
}

impl LanceDbTable {
    fn distance_type(&self) -> DistanceType {
        match self.metric {
            VectorMetric::L2 => DistanceType::L2,
            VectorMetric::Cosine => DistanceType::Cosine,
            VectorMetric::Dot => DistanceType::Dot,
        }
    }

    /// Convert records to a RecordBatch matching the table schema.
    fn records_to_batch(&self, records: &[VectorRecord], dimension: usize) -> DbResult<RecordBatch> {
        let schema = LanceDbStore::create_schema(dimension)?;

        let flat_vectors: Vec<f32> = records.iter().flat_map(|r| r.vector.clone()).collect();
        let values = Float32Array::from(flat_vectors);
        let width = list_width(dimension)?;
        let vector_array = FixedSizeListArray::try_new_from_values(values, width)
            .map_err(|e| DbError::internal(format!("Failed to create vector array: {}", e)))?;
        let vectors: ArrayRef = Arc::new(vector_array);

        let texts: ArrayRef = Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.text.as_deref())
                .collect::<Vec<_>>(),
        ));

        let metadata: ArrayRef = Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.metadata.as_deref())
                .collect::<Vec<_>>(),
        ));

        RecordBatch::try_new(Arc::new(schema), vec![vectors, texts, metadata])
            .map_err(|e| DbError::internal(format!("Failed to create batch: {}", e)))
    }

    /// Decode search result batches into hits.
    fn parse_hits(batches: Vec<RecordBatch>) -> DbResult<Vec<SearchHit>> {
        let mut hits = Vec::new();

        for batch in batches {
            let vectors = batch
                .column_by_name(VECTOR_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>());
            let texts = batch
                .column_by_name(TEXT_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>());
            let metadata = batch
                .column_by_name(METADATA_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>());
            let distances = batch
                .column_by_name(DISTANCE_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            let (Some(vectors), Some(texts), Some(metadata), Some(distances)) =
                (vectors, texts, metadata, distances)
            else {
                return Err(DbError::internal(format!(
                    "Search result batch is missing expected columns: {:?}",
                    batch
                        .schema()
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                )));
            };

            for i in 0..batch.num_rows() {
                let row = vectors.value(i);
                let vector = row
                    .as_any()
                    .downcast_ref::<Float32Array>()
                    .map(|values| values.values().to_vec())
                    .unwrap_or_default();

                let mut record = VectorRecord::new(vector);
                if !texts.is_null(i) {
                    record.text = Some(texts.value(i).to_string());
                }
                if !metadata.is_null(i) {
                    record.metadata = Some(metadata.value(i).to_string());
                }

                hits.push(SearchHit::from_record(record, distances.value(i)));
            }
        }

        Ok(hits)
    }
}

impl TableBackend for LanceDbTable {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn dimension(&self) -> DbResult<usize> {
        let schema = self
            .runtime
            .block_on(async { self.table.schema().await })
            .map_err(|e| DbError::LanceDb {
                message: format!("Failed to read schema: {}", e),
            })?;

        let field = schema
            .field_with_name(VECTOR_COLUMN)
            .map_err(|e| DbError::internal(format!("Table has no vector column: {}", e)))?;

        match field.data_type() {
            DataType::FixedSizeList(_, size) => Ok(*size as usize),
            other => Err(DbError::internal(format!(
                "Unexpected vector column type: {}",
                other
            ))),
        }
    }

    fn add(&self, records: &[VectorRecord]) -> DbResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!("Adding {} rows to '{}'", records.len(), self.name());

        let dimension = self.dimension()?;
        for record in records {
            if record.vector.len() != dimension {
                return Err(DbError::DimensionMismatch {
                    expected: dimension,
                    actual: record.vector.len(),
                });
            }
        }

        let batch = self.records_to_batch(records, dimension)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        self.runtime.block_on(async {
            self.table
                .add(Box::new(batches))
                .execute()
                .await
                .map_err(|e| DbError::LanceDb {
                    message: format!("Insert failed: {}", e),
                })?;
            Ok(())
        })
    }

    fn search(&self, vector: &[f32], limit: usize) -> DbResult<Vec<SearchHit>> {
        trace!("Searching '{}', limit={}", self.name(), limit);

        if self.count_rows()? == 0 {
            return Ok(Vec::new());
        }

        self.runtime.block_on(async {
            let query = self
                .table
                .vector_search(vector.to_vec())
                .map_err(|e| DbError::LanceDb {
                    message: format!("Failed to create query: {}", e),
                })?
                .distance_type(self.distance_type())
                .limit(limit);

            let results = query.execute().await.map_err(|e| DbError::LanceDb {
                message: format!("Query failed: {}", e),
            })?;

            let batches: Vec<RecordBatch> =
                results.try_collect().await.map_err(|e| DbError::LanceDb {
                    message: format!("Failed to collect results: {}", e),
                })?;

            Self::parse_hits(batches)
        })
    }

    fn count_rows(&self) -> DbResult<usize> {
        self.runtime
            .block_on(async { self.table.count_rows(None).await })
            .map_err(|e| DbError::LanceDb {
                message: format!("Count failed: {}", e),
            })
    }
}

/// Arrow list width for a vector dimension.
fn list_width(dimension: usize) -> DbResult<i32> {
    match i32::try_from(dimension) {
        Ok(width) if width > 0 => Ok(width),
        _ => Err(DbError::InvalidDimension { dimension }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, LanceDbStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::new(temp_dir.path().join("vectors"));
        let store = LanceDbStore::connect(&config).expect("Failed to connect");
        (temp_dir, store)
    }

    #[test]
    fn test_schema_layout() {
        let schema = LanceDbStore::create_schema(3).unwrap();
        assert_eq!(schema.fields().len(), 3);
        assert!(matches!(
            schema.field_with_name(VECTOR_COLUMN).unwrap().data_type(),
            DataType::FixedSizeList(_, 3)
        ));
        assert!(schema.field_with_name(TEXT_COLUMN).unwrap().is_nullable());
    }

    #[test]
    fn test_oversized_dimension_is_rejected() {
        assert_eq!(list_width(384).unwrap(), 384);
        assert!(matches!(
            LanceDbStore::create_schema(4_294_967_299).unwrap_err(),
            DbError::InvalidDimension {
                dimension: 4_294_967_299
            }
        ));
        assert!(list_width(0).is_err());

        let (_temp, store) = create_test_store();
        assert!(store
            .create_table("wide", &TableSchema::new(4_294_967_299))
            .is_err());
        assert!(store.open_table("wide").is_err());
    }

    #[test]
    fn test_result_batch_without_expected_columns_is_an_error() {
        let schema = Schema::new(vec![Field::new(TEXT_COLUMN, DataType::Utf8, true)]);
        let texts: ArrayRef = Arc::new(StringArray::from(vec![Some("a")]));
        let batch = RecordBatch::try_new(Arc::new(schema), vec![texts]).unwrap();

        let err = LanceDbTable::parse_hits(vec![batch]).unwrap_err();
        assert!(err.to_string().contains("missing expected columns"));
        assert!(LanceDbTable::parse_hits(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_create_add_search() {
        let (_temp, store) = create_test_store();
        let table = store.create_table("t", &TableSchema::new(3)).unwrap();
        assert_eq!(table.dimension().unwrap(), 3);
        assert!(table.search(&[1.0, 0.0, 0.0], 10).unwrap().is_empty());

        table
            .add(&[
                VectorRecord::new(vec![1.0, 0.0, 0.0]).with_text("a"),
                VectorRecord::new(vec![0.0, 1.0, 0.0])
                    .with_text("b")
                    .with_metadata(r#"{"tag":"second"}"#),
            ])
            .unwrap();

        let hits = table.search(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text.as_deref(), Some("a"));
        assert_eq!(hits[0].vector, vec![1.0, 0.0, 0.0]);

        let hits = table.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].metadata, Some(serde_json::json!({"tag": "second"})));
    }

    #[test]
    fn test_overwrite_and_open() {
        let (_temp, store) = create_test_store();
        let table = store.create_table("t", &TableSchema::new(2)).unwrap();
        table.add(&[VectorRecord::new(vec![1.0, 2.0])]).unwrap();

        let recreated = store.create_table("t", &TableSchema::new(2)).unwrap();
        assert_eq!(recreated.count_rows().unwrap(), 0);

        let opened = store.open_table("t").unwrap();
        assert_eq!(opened.count_rows().unwrap(), 0);
        assert_eq!(store.table_names().unwrap(), vec!["t".to_string()]);
    }

    #[test]
    fn test_open_missing_table() {
        let (_temp, store) = create_test_store();
        let err = store.open_table("nope").err().unwrap();
        assert!(err.is_table_not_found(), "unexpected error: {err}");
    }
}
