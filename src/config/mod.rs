//! Configuration management for precache

pub mod schema;

pub use schema::Config;

use crate::error::{PrecacheError, PrecacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("precache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("precache")
    }

    /// Get the directory holding the caches for a config
    pub fn caches_dir(config: &Config) -> PathBuf {
        config
            .storage
            .dir
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("caches"))
    }

    /// Parse the configured origin
    pub fn origin(&self, config: &Config) -> PrecacheResult<Url> {
        Url::parse(&config.origin.base_url).map_err(|e| PrecacheError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: format!("origin.base_url '{}': {}", config.origin.base_url, e),
        })
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> PrecacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PrecacheResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            PrecacheError::io(format!("reading config from {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| PrecacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> PrecacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrecacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            PrecacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
