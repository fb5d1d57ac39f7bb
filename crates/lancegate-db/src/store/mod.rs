//! Vector store module for lancegate-db.
//!
//! ## Available Backends
//!
//! - `lancedb` (default): LanceDB with ANN search
//! - `simple`: File-based backend for testing/small stores
//!
//! ## Usage
//!
//! ```ignore
//! use lancegate_db::store::{open_store, StoreConfig, TableSchema, VectorRecord};
//!
//! let store = open_store(&StoreConfig::new("data/vectors"))?;
//! let table = store.create_table("docs", &TableSchema::new(3))?;
//! table.add(&[VectorRecord::new(vec![1.0, 0.0, 0.0]).with_text("a")])?;
//! let hits = table.search(&[1.0, 0.0, 0.0], 10)?;
//! ```

mod backend;
mod config;
mod traits;

pub use config::{
    load_table_meta, table_meta_path, write_table_meta, StoreConfig, TableMeta, DEFAULT_BACKEND,
    TABLE_META_SUFFIX,
};
pub use traits::{
    SearchHit, TableBackend, TableSchema, VectorMetric, VectorRecord, VectorStoreBackend,
};

pub use backend::{available_backends, is_backend_available, open_store};

#[cfg(feature = "lancedb")]
pub use backend::{LanceDbStore, LanceDbTable};

#[cfg(feature = "simple")]
pub use backend::{SimpleFileStore, SimpleFileTable};
