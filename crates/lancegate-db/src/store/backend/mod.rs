//! Vector store backend implementations.
//!
//! ## Available Backends
//!
//! - `lancedb` (default): Production-ready LanceDB with ANN search
//! - `simple`: File-based backend for testing/small stores

#[cfg(feature = "lancedb")]
mod lancedb;

#[cfg(feature = "simple")]
mod simple;

#[cfg(feature = "lancedb")]
pub use self::lancedb::{LanceDbStore, LanceDbTable};

#[cfg(feature = "simple")]
pub use simple::{SimpleFileStore, SimpleFileTable};

use super::config::StoreConfig;
use super::traits::VectorStoreBackend;
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::debug;

/// Open a vector store with the given configuration.
///
/// This is the factory for connection handles. It picks the backend named
/// in `config.backend` and connects it to `config.location`.
///
/// # Errors
///
/// Returns an error if:
/// - The backend is not supported (or its feature is disabled)
/// - The backend cannot connect to the location
pub fn open_store(config: &StoreConfig) -> DbResult<Arc<dyn VectorStoreBackend>> {
    debug!(
        "Opening '{}' vector store at {:?}",
        config.backend, config.location
    );

    match config.backend.as_str() {
        #[cfg(feature = "lancedb")]
        "lancedb" => {
            let store = LanceDbStore::connect(config)?;
            Ok(Arc::new(store))
        }

        #[cfg(feature = "simple")]
        "simple" => {
            let store = SimpleFileStore::connect(config)?;
            Ok(Arc::new(store))
        }

        backend => Err(DbError::UnknownBackend {
            backend: backend.to_string(),
            available: available_backends().join(", "),
        }),
    }
}

/// Get a list of available backend names.
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    #[cfg(feature = "lancedb")]
    backends.push("lancedb");

    #[cfg(feature = "simple")]
    backends.push("simple");

    backends
}

/// Whether `backend` names a backend compiled into this build.
pub fn is_backend_available(backend: &str) -> bool {
    available_backends().contains(&backend)
}

// ============================================================================
// Tests
// ============================================================================
