//! Configuration schema for precache
//!
//! Configuration is stored at `~/.config/precache/config.toml`. The cache
//! name and the pre-cache URL list are compiled in and not configurable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Origin the worker is scoped to
    pub origin: OriginConfig,

    /// Cache storage settings
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Origin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL that pre-cache paths and fetched paths resolve against
    pub base_url: String,

    /// Whole-request network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Cache storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the caches (defaults to the state directory)
    pub dir: Option<PathBuf>,
}
