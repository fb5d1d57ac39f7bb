//! # lancegate-core
//!
//! **lancegate** – a serialized gateway over an embedded vector store.
//!
//! This crate provides the domain logic: connection lifecycle, table
//! management, vector ingestion and similarity search. It is consumed by the
//! `lancegate` CLI and can be embedded in other Rust tools.
//!
//! ## Main Types
//!
//! - [`Gateway`] – the entry point for all operations
//! - [`GatewayConfig`] – where and how to connect
//! - [`GatewayError`] – validation or database failure
//!
//! ## Modules
//!
//! - [`config`] – configuration loading (YAML file, environment)
//! - [`gateway`] – the Gateway implementation
//! - [`errors`] – error types
//! - [`models`] – request and report types
//!
//! ## Example
//!
//! ```ignore
//! use lancegate_core::{Gateway, GatewayConfig, SearchQuery, TableConfig, VectorData};
//!
//! let gateway = Gateway::new(GatewayConfig::new("data/vectors"));
//! gateway.connect()?;
//!
//! gateway.create_table(&TableConfig::new("docs", 3))?;
//! gateway.add_vector("docs", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("hello"))?;
//!
//! let hits = gateway.search_vectors("docs", &SearchQuery::new(vec![1.0, 0.0, 0.0]))?;
//! println!("nearest: {:?}", hits.first().and_then(|h| h.text.as_deref()));
//!
//! gateway.disconnect()?;
//! ```

// Modules
pub mod config;
pub mod constants;
pub mod db_adapter;
pub mod errors;
pub mod gateway;
pub mod models;

// Re-exports
pub use config::GatewayConfig;
pub use errors::{ConfigError, DatabaseErrorKind, GatewayError, GatewayResult};
pub use gateway::{Gateway, StoreOpener};
pub use models::{
    is_valid_table_name, GatewayStatus, SearchHit, SearchQuery, TableConfig, TableInfo, VectorData,
};

pub use lancegate_db::store::{available_backends, VectorMetric};
