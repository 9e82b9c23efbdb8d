//! `docvec` Configuration Module
//!
//! Provides configuration file support via `docvec.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`DOCVEC_*`)
//! 3. Configuration file (`docvec.toml`)
//! 4. Default values

use crate::index::GraphParams;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Graph construction and search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum connections per node per layer (M). Layer 0 allows `2 * M`.
    pub max_connections: usize,
    /// Beam width used while inserting.
    pub ef_construction: usize,
    /// Default beam width used while searching.
    pub ef_search: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_connections: GraphParams::DEFAULT_MAX_CONNECTIONS,
            ef_construction: GraphParams::DEFAULT_EF_CONSTRUCTION,
            ef_search: GraphParams::DEFAULT_EF_SEARCH,
        }
    }
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `graph.dvx` and `ids.json`.
    pub data_dir: PathBuf,
    /// Persist synchronously before every batch call returns.
    pub persist_on_batch: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./docvec_data"),
            persist_on_batch: true,
        }
    }
}

/// Ingestion configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Documents per atomic batch when a caller streams a large input.
    pub batch_size: usize,
    /// Maximum accepted text length in bytes.
    pub max_text_len: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_text_len: 65_536,
        }
    }
}

/// Search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when the caller does not ask for a specific `k`.
    pub default_k: usize,
    /// Upper bound on `k`.
    pub max_k: usize,
    /// Upper bound on a per-query `ef` override.
    pub max_ef: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: 1000,
            max_ef: 4096,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `docvec` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocvecConfig {
    /// Graph parameters.
    pub index: IndexConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Ingestion configuration.
    pub ingest: IngestConfig,
    /// Search configuration.
    pub search: SearchConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl DocvecConfig {
    /// Loads configuration from `docvec.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("docvec.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error: defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DOCVEC_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = self.index.max_connections;
        if !(GraphParams::MIN_MAX_CONNECTIONS..=GraphParams::MAX_MAX_CONNECTIONS).contains(&m) {
            return Err(ConfigError::InvalidValue {
                key: "index.max_connections".to_string(),
                message: format!(
                    "value {m} is out of range [{}, {}]",
                    GraphParams::MIN_MAX_CONNECTIONS,
                    GraphParams::MAX_MAX_CONNECTIONS
                ),
            });
        }

        if self.index.ef_construction == 0 || self.index.ef_construction > 4096 {
            return Err(ConfigError::InvalidValue {
                key: "index.ef_construction".to_string(),
                message: format!(
                    "value {} is out of range [1, 4096]",
                    self.index.ef_construction
                ),
            });
        }

        if self.index.ef_search == 0 || self.index.ef_search > self.search.max_ef {
            return Err(ConfigError::InvalidValue {
                key: "index.ef_search".to_string(),
                message: format!(
                    "value {} is out of range [1, {}]",
                    self.index.ef_search, self.search.max_ef
                ),
            });
        }

        if self.ingest.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ingest.batch_size".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.ingest.max_text_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ingest.max_text_len".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.search.default_k == 0 || self.search.default_k > self.search.max_k {
            return Err(ConfigError::InvalidValue {
                key: "search.default_k".to_string(),
                message: format!(
                    "value {} is out of range [1, {}]",
                    self.search.default_k, self.search.max_k
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Builds graph parameters for an index of the given dimension.
    #[must_use]
    pub fn graph_params(&self, dimension: usize) -> GraphParams {
        GraphParams {
            dimension,
            max_connections: self.index.max_connections,
            ef_construction: self.index.ef_construction,
            ef_search: self.index.ef_search,
        }
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
