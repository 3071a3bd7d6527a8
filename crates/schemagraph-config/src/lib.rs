//! SchemaGraph Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.schemagraph/config.toml`
//! - Local config: `.schemagraph/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::{ConfigError, FileAction};
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log levels accepted in `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration for SchemaGraph.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SchemaGraphConfig {
    /// Metadata store configuration
    pub store: StoreConfig,

    /// Schema reader configuration
    pub reader: ReaderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Metadata store configuration.
///
/// # Example TOML
///
/// ```toml
/// [store]
/// path = "data/metadata.db"
/// read_only = true
/// cache_size_kb = 32000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite metadata database (default: `metadata.db`)
    pub path: PathBuf,

    /// Open the database read-only and never create it
    pub read_only: bool,

    /// SQLite page cache size in KB
    pub cache_size_kb: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("metadata.db"),
            read_only: true,
            cache_size_kb: 16000,
        }
    }
}

/// Schema reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Validate navigation properties against relationship constraints
    pub validate_navigation: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            validate_navigation: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override metadata database path
    pub store_path: Option<PathBuf>,

    /// Override navigation validation
    pub validate_navigation: Option<bool>,

    /// Override log level
    pub log_level: Option<String>,
}

impl SchemaGraphConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.store_path {
            self.store.path = path.clone();
        }

        if let Some(validate) = overrides.validate_navigation {
            self.reader.validate_navigation = validate;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}'. Valid values: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        if self.store.cache_size_kb <= 0 {
            return Err(ConfigError::invalid_value(
                "store.cache_size_kb",
                format!("must be positive, got {}", self.store.cache_size_kb),
            ));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value("store.path", "must not be empty"));
        }

        Ok(())
    }

    /// Get the effective store path for a workspace.
    pub fn store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            workspace_root.join(&self.store.path)
        }
    }
}
