//! Configuration management for tree-cache

pub mod schema;

pub use schema::Config;

use crate::error::{TreeCacheError, TreeCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the repository-local config file
pub const LOCAL_CONFIG_FILE: &str = ".tree-cache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Config manager that only uses built-in defaults
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: Some(path),
        }
    }

    /// Look for `.tree-cache.toml` in `start` and its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("tree-cache")
    }

    /// Get the file hand-off directory path
    pub fn handoff_dir() -> PathBuf {
        Self::state_dir().join("handoff")
    }

    /// Load configuration, falling back to defaults when there is no file
    pub async fn load(&self) -> TreeCacheResult<Config> {
        match &self.config_path {
            Some(path) => self.load_from_file(path).await,
            None => {
                debug!("No config file, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> TreeCacheResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            TreeCacheError::io(format!("reading config from {}", path.display()), e)
        })?;

        let config = toml::from_str(&content).map_err(|e| TreeCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
