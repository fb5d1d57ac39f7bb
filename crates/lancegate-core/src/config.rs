//! Gateway configuration.
//!
//! [`GatewayConfig`] is loaded from `~/.lancegate/config.yaml` (or an explicit
//! path), then overridden by `LANCEGATE_*` environment variables. Callers such
//! as the CLI apply their own flags last.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use lancegate_db::store::{available_backends, is_backend_available, StoreConfig, VectorMetric};

use crate::constants::{
    CONFIG_FILENAME, DEFAULT_LOCATION, ENV_BACKEND, ENV_LOCATION, LANCEGATE_HOME_DIR,
};
use crate::errors::ConfigError;

/// Configuration for a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Directory (or URI) of the vector store.
    #[serde(default = "default_location")]
    pub location: PathBuf,

    /// Storage backend name ("lancedb" or "simple").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Distance metric used for search.
    #[serde(default)]
    pub metric: VectorMetric,

    /// Open and cache every existing table on connect.
    #[serde(default = "default_preload")]
    pub preload_tables: bool,
}

fn default_location() -> PathBuf {
    PathBuf::from(DEFAULT_LOCATION)
}

fn default_backend() -> String {
    lancegate_db::store::DEFAULT_BACKEND.to_string()
}

fn default_preload() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            backend: default_backend(),
            metric: VectorMetric::default(),
            preload_tables: default_preload(),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration for the given store location.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
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

    /// Enable or disable table preloading on connect.
    pub fn with_preload_tables(mut self, preload: bool) -> Self {
        self.preload_tables = preload;
        self
    }

    /// Load from the default location (`~/.lancegate/config.yaml`).
    ///
    /// Falls back to defaults when the home directory cannot be determined
    /// or the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path, returning defaults if it does not exist.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // An empty file parses as YAML null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the default config directory (`~/.lancegate`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(LANCEGATE_HOME_DIR))
    }

    /// Get the default config file path (`~/.lancegate/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(CONFIG_FILENAME))
    }

    /// Apply `LANCEGATE_LOCATION` and `LANCEGATE_BACKEND` from the process
    /// environment.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply environment-style overrides from an arbitrary lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(location) = lookup(ENV_LOCATION).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Using store location from {}", ENV_LOCATION);
            self.location = PathBuf::from(location);
        }
        if let Some(backend) = lookup(ENV_BACKEND).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Using backend from {}", ENV_BACKEND);
            self.backend = backend.trim().to_string();
        }
        self
    }

    /// Check that the configuration can be used to connect.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "store location is empty".to_string(),
                hint: format!("Set `location` in the config file or {}", ENV_LOCATION),
            });
        }

        if !is_backend_available(&self.backend) {
            return Err(ConfigError::Invalid {
                message: format!("unknown backend '{}'", self.backend),
                hint: format!("Available backends: {}", available_backends().join(", ")),
            });
        }

        Ok(())
    }

    /// Store configuration handed to the backend factory.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.location)
            .with_backend(&self.backend)
            .with_metric(self.metric)
    }
}
