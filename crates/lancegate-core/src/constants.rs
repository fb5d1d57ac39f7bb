//! Shared constants for lancegate.

/// Default store location when none is configured.
pub const DEFAULT_LOCATION: &str = "data/vectors";

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Table created on connect to verify the store is writable.
///
/// Hidden from table listings.
pub const BOOKKEEPING_TABLE: &str = "_init";

/// Prefix reserved for internal tables.
pub const RESERVED_TABLE_PREFIX: char = '_';

/// Maximum accepted table name length.
pub const MAX_TABLE_NAME_LEN: usize = 128;

/// Largest accepted vector dimension.
pub const MAX_DIMENSION: usize = i32::MAX as usize;

/// Directory under the home directory holding user configuration.
pub const LANCEGATE_HOME_DIR: &str = ".lancegate";

/// Name of the user configuration file.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Environment variable overriding the store location.
pub const ENV_LOCATION: &str = "LANCEGATE_LOCATION";

/// Environment variable overriding the backend.
pub const ENV_BACKEND: &str = "LANCEGATE_BACKEND";

/// Whether `name` is reserved for internal bookkeeping.
pub fn is_reserved_table_name(name: &str) -> bool {
    name.starts_with(RESERVED_TABLE_PREFIX)
}
