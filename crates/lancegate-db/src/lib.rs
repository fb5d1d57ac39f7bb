//! # lancegate-db
//!
//! Infrastructure layer for lancegate: the vector-store client that the
//! gateway in `lancegate-core` drives.
//!
//! Keeping the heavy LanceDB/Arrow stack in its own crate means:
//!
//! - Changes to `lancegate-core` compile fast
//! - Backends can be swapped without changing the gateway
//! - Tests can run against the small file-based backend
//!
//! ## Architecture
//!
//! ```text
//! lancegate-cli → lancegate-core → (traits)
//!                       ↑
//!                lancegate-db (implements VectorStoreBackend / TableBackend)
//! ```
//!
//! ## Features
//!
//! - `lancedb` (default): LanceDB vector storage with ANN search
//! - `simple`: Simple file-based vector backend for testing

pub mod error;
pub mod store;

pub use error::{DbError, DbResult};
