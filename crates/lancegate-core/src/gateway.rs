//! The vector store gateway.
//!
//! [`Gateway`] owns at most one store connection and a cache of open table
//! handles. Every operation holds one lock for its whole duration, so
//! concurrent callers observe operations one at a time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use lancegate_db::store::{
    open_store, SearchHit, StoreConfig, TableBackend, TableSchema, VectorRecord,
    VectorStoreBackend,
};
use lancegate_db::DbResult;

use crate::config::GatewayConfig;
use crate::constants::{is_reserved_table_name, BOOKKEEPING_TABLE};
use crate::db_adapter::{from_db_error, IntoGatewayResult};
use crate::errors::{DatabaseErrorKind, GatewayError, GatewayResult};
use crate::models::{
    validate_table_name, GatewayStatus, SearchQuery, TableConfig, TableInfo, VectorData,
};

// ============================================================================
// State
// ============================================================================

/// Mutable state guarded by the gateway lock.
#[derive(Default)]
struct GatewayState {
    /// Live connection, if any.
    store: Option<Arc<dyn VectorStoreBackend>>,
    /// Open table handles keyed by name.
    tables: HashMap<String, Arc<dyn TableBackend>>,
    /// When the current connection was opened.
    connected_at: Option<DateTime<Utc>>,
}

impl GatewayState {
    fn reset(&mut self) -> Option<Arc<dyn VectorStoreBackend>> {
        self.tables.clear();
        self.connected_at = None;
        self.store.take()
    }

    fn store(&self) -> GatewayResult<Arc<dyn VectorStoreBackend>> {
        self.store.clone().ok_or_else(GatewayError::not_connected)
    }

    /// Cached handle, else open from the store and cache it.
    fn resolve_table(&mut self, name: &str) -> GatewayResult<Arc<dyn TableBackend>> {
        if let Some(table) = self.tables.get(name) {
            return Ok(Arc::clone(table));
        }

        let store = self.store()?;
        match store.open_table(name) {
            Ok(table) => {
                debug!("Opened table '{}'", name);
                self.tables.insert(name.to_string(), Arc::clone(&table));
                Ok(table)
            }
            Err(e) => {
                debug!("Failed to open table '{}': {}", name, e);
                Err(GatewayError::from_db(
                    DatabaseErrorKind::TableNotFound,
                    format!("Table {} not found", name),
                    e,
                ))
            }
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Opens a store connection for a configuration.
pub type StoreOpener =
    Arc<dyn Fn(&StoreConfig) -> DbResult<Arc<dyn VectorStoreBackend>> + Send + Sync>;

/// Serialized access to a vector store.
///
/// Construct with [`Gateway::new`], then [`connect`](Gateway::connect) before
/// any table operation. Share across threads with `Arc<Gateway>`.
pub struct Gateway {
    config: GatewayConfig,
    opener: StoreOpener,
    state: Mutex<GatewayState>,
}

impl Gateway {
    /// Create a disconnected gateway using the built-in backends.
    pub fn new(config: GatewayConfig) -> Self {
        let opener: StoreOpener = Arc::new(open_store);
        Self::with_store_opener(config, opener)
    }

    /// Create a disconnected gateway that opens its store with `opener`.
    pub fn with_store_opener(config: GatewayConfig, opener: StoreOpener) -> Self {
        Self {
            config,
            opener,
            state: Mutex::new(GatewayState::default()),
        }
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        // Every operation leaves the state consistent before it can panic
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the store and verify it is writable.
    ///
    /// Any previous connection and cached handles are discarded first. On
    /// failure the gateway stays disconnected.
    pub fn connect(&self) -> GatewayResult<()> {
        let location = &self.config.location;
        if location.as_os_str().is_empty() {
            return Err(GatewayError::validation("Store location must not be empty"));
        }

        let mut state = self.lock();
        if let Some(old) = state.reset() {
            debug!("Replacing existing connection to {}", old.location().display());
            if let Err(e) = old.close() {
                warn!("Failed to close previous connection: {}", e);
            }
        }

        info!(
            "Connecting to '{}' store at {}",
            self.config.backend,
            location.display()
        );

        ensure_parent_dir(location)?;

        let store = (self.opener)(&self.config.store_config()).map_err(|e| {
            GatewayError::from_db(
                DatabaseErrorKind::Connect,
                format!("Failed to connect to {}", location.display()),
                e,
            )
        })?;

        store
            .create_table(BOOKKEEPING_TABLE, &TableSchema::new(1))
            .map_err(|e| {
                GatewayError::from_db(
                    DatabaseErrorKind::Connect,
                    format!("Store at {} is not writable", location.display()),
                    e,
                )
            })?;

        if self.config.preload_tables {
            preload_tables(store.as_ref(), &mut state.tables);
        }

        state.connected_at = Some(Utc::now());
        info!(
            "Connected to {} via {} ({} tables cached)",
            location.display(),
            store.backend_name(),
            state.tables.len()
        );
        state.store = Some(store);
        Ok(())
    }

    /// Drop cached handles and close the connection.
    ///
    /// Does nothing when not connected. The gateway is disconnected afterwards
    /// even if closing fails.
    pub fn disconnect(&self) -> GatewayResult<()> {
        let mut state = self.lock();
        let Some(store) = state.reset() else {
            debug!("Disconnect requested while not connected");
            return Ok(());
        };

        store
            .close()
            .into_gateway_result(format!("Failed to close {}", store.location().display()))?;
        info!("Disconnected from {}", store.location().display());
        Ok(())
    }

    /// Whether a connection is live.
    pub fn is_connected(&self) -> bool {
        self.lock().store.is_some()
    }

    /// Create a table, replacing any existing table of the same name.
    pub fn create_table(&self, config: &TableConfig) -> GatewayResult<()> {
        let mut state = self.lock();
        let store = state.store()?;
        config.validate()?;

        let table = store
            .create_table(&config.name, &TableSchema::new(config.dimension))
            .into_gateway_result(format!("Failed to create table {}", config.name))?;

        state.tables.insert(config.name.clone(), table);
        info!(
            "Created table '{}' (dimension {})",
            config.name, config.dimension
        );
        Ok(())
    }

    /// Append one vector to a table.
    pub fn add_vector(&self, table_name: &str, data: &VectorData) -> GatewayResult<()> {
        let mut state = self.lock();
        state.store()?;
        validate_table_name(table_name)?;
        data.validate()?;

        let table = state.resolve_table(table_name)?;
        check_dimension(table.as_ref(), data.vector.len())?;

        let mut record = VectorRecord::new(data.vector.clone());
        record.text = data.stored_text();
        record.metadata = data.encoded_metadata()?;

        table
            .add(std::slice::from_ref(&record))
            .into_gateway_result(format!("Failed to add vector to {}", table_name))?;
        debug!("Added vector to '{}'", table_name);
        Ok(())
    }

    /// Nearest-neighbour search, ranked by ascending distance.
    pub fn search_vectors(
        &self,
        table_name: &str,
        query: &SearchQuery,
    ) -> GatewayResult<Vec<SearchHit>> {
        let mut state = self.lock();
        state.store()?;
        validate_table_name(table_name)?;
        query.validate()?;

        let table = state.resolve_table(table_name)?;
        check_dimension(table.as_ref(), query.vector.len())?;

        let hits = table
            .search(&query.vector, query.limit)
            .into_gateway_result(format!("Failed to search {}", table_name))?;
        debug!(
            "Search on '{}' returned {} hits (limit {})",
            table_name,
            hits.len(),
            query.limit
        );
        Ok(hits)
    }

    /// Names of user tables, sorted, without internal tables.
    pub fn list_tables(&self) -> GatewayResult<Vec<String>> {
        let state = self.lock();
        let store = state.store()?;

        let mut names: Vec<String> = store
            .table_names()
            .into_gateway_result("Failed to list tables")?
            .into_iter()
            .filter(|name| !is_reserved_table_name(name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Dimension and row count of a table.
    pub fn describe_table(&self, table_name: &str) -> GatewayResult<TableInfo> {
        let mut state = self.lock();
        state.store()?;
        validate_table_name(table_name)?;

        let table = state.resolve_table(table_name)?;
        let context = format!("Failed to describe {}", table_name);
        let dimension = table.dimension().into_gateway_result(context.clone())?;
        let rows = table.count_rows().into_gateway_result(context)?;

        Ok(TableInfo {
            name: table_name.to_string(),
            dimension,
            rows,
        })
    }

    /// Snapshot of the connection state.
    pub fn status(&self) -> GatewayStatus {
        let state = self.lock();
        let mut cached_tables: Vec<String> = state.tables.keys().cloned().collect();
        cached_tables.sort();

        GatewayStatus {
            connected: state.store.is_some(),
            location: self.config.location.display().to_string(),
            backend: state
                .store
                .as_ref()
                .map(|store| store.backend_name().to_string())
                .unwrap_or_else(|| self.config.backend.clone()),
            connected_at: state.connected_at.map(|t| t.to_rfc3339()),
            cached_tables,
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether `location` is a URI such as `s3://bucket/db` rather than a path.
fn is_uri(location: &Path) -> bool {
    let Some((scheme, _)) = location.to_str().and_then(|s| s.split_once("://")) else {
        return false;
    };
    // A single letter is a Windows drive, not a scheme
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn ensure_parent_dir(location: &Path) -> GatewayResult<()> {
    if is_uri(location) {
        return Ok(());
    }
    let Some(parent) = location.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|e| {
        GatewayError::from_db(
            DatabaseErrorKind::Connect,
            format!("Failed to create {}", parent.display()),
            e.into(),
        )
    })
}

fn preload_tables(
    store: &dyn VectorStoreBackend,
    tables: &mut HashMap<String, Arc<dyn TableBackend>>,
) {
    let names = match store.table_names() {
        Ok(names) => names,
        Err(e) => {
            warn!("Failed to list tables for preloading: {}", e);
            return;
        }
    };

    for name in names.into_iter().filter(|n| !is_reserved_table_name(n)) {
        match store.open_table(&name) {
            Ok(table) => {
                debug!("Preloaded table '{}'", name);
                tables.insert(name, table);
            }
            Err(e) => warn!("Failed to open table {}: {}", name, e),
        }
    }
}

fn check_dimension(table: &dyn TableBackend, actual: usize) -> GatewayResult<()> {
    let expected = table
        .dimension()
        .map_err(|e| from_db_error(format!("Failed to read schema of {}", table.name()), e))?;
    if expected != actual {
        return Err(GatewayError::dimension_mismatch(expected, actual));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
