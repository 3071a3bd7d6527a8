//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.schemagraph/config.toml`
//! 2. Local config: `.schemagraph/config.toml` (in workspace)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::{ConfigError, FileAction};
use crate::{ConfigOverrides, LoggingConfig, ReaderConfig, SchemaGraphConfig, StoreConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".schemagraph";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".schemagraph";

/// Configuration loader with inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.schemagraph`)
    global_config_dir: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.schemagraph`).
    pub fn new() -> Self {
        Self {
            global_config_dir: dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR)),
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a workspace.
    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a workspace with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates.
    pub fn load(
        &self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SchemaGraphConfig, ConfigError> {
        let mut config = SchemaGraphConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(workspace_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&self) -> Result<Option<SchemaGraphConfig>, ConfigError> {
        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        load_config_file(&global_path).map(Some)
    }

    /// Load only the local configuration for a workspace.
    pub fn load_local(
        &self,
        workspace_root: &Path,
    ) -> Result<Option<SchemaGraphConfig>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Initialize local configuration for a workspace.
    ///
    /// Writes `config` to `.schemagraph/config.toml`. An existing file is
    /// left untouched unless `force` is set. Returns the path and whether
    /// the file was written.
    pub fn init_local(
        &self,
        workspace_root: &Path,
        config: &SchemaGraphConfig,
        force: bool,
    ) -> Result<(PathBuf, bool), ConfigError> {
        let config_path = self.local_config_path(workspace_root);

        if config_path.exists() && !force {
            debug!("Keeping existing local config {:?}", config_path);
            return Ok((config_path, false));
        }

        config.validate()?;
        save_config_file(&config_path, config)?;
        debug!("Wrote local config {:?}", config_path);
        Ok((config_path, true))
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<SchemaGraphConfig, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::io(FileAction::Read, path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &SchemaGraphConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io(FileAction::CreateDir, parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::io(FileAction::Write, path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// A field of the overlay wins only if it differs from its default, so a
/// partial file never resets values set by an earlier source.
fn merge_configs(base: SchemaGraphConfig, overlay: SchemaGraphConfig) -> SchemaGraphConfig {
    SchemaGraphConfig {
        store: merge_store(base.store, overlay.store),
        reader: merge_reader(base.reader, overlay.reader),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_store(base: StoreConfig, overlay: StoreConfig) -> StoreConfig {
    let defaults = StoreConfig::default();
    StoreConfig {
        path: if overlay.path != defaults.path {
            overlay.path
        } else {
            base.path
        },
        read_only: if overlay.read_only != defaults.read_only {
            overlay.read_only
        } else {
            base.read_only
        },
        cache_size_kb: if overlay.cache_size_kb != defaults.cache_size_kb {
            overlay.cache_size_kb
        } else {
            base.cache_size_kb
        },
    }
}

fn merge_reader(base: ReaderConfig, overlay: ReaderConfig) -> ReaderConfig {
    ReaderConfig {
        validate_navigation: if overlay.validate_navigation
            != ReaderConfig::default().validate_navigation
        {
            overlay.validate_navigation
        } else {
            base.validate_navigation
        },
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let defaults = LoggingConfig::default();
    LoggingConfig {
        level: if overlay.level != defaults.level {
            overlay.level
        } else {
            base.level
        },
        format: if overlay.format != defaults.format {
            overlay.format
        } else {
            base.format
        },
    }
}
