//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Unexpected response status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Cache errors
    #[error("Failed to pre-cache {url}: {reason}")]
    AddAllFailed { url: String, reason: String },

    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    CorruptEntry { path: PathBuf, reason: String },

    // Lifecycle errors
    #[error("Cache not found: {0}. The worker has not been installed")]
    NotInstalled(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a failure of one pre-cache URL so the whole install reports it
    pub fn add_all_failed(url: impl Into<String>, cause: &PrecacheError) -> Self {
        Self::AddAllFailed {
            url: url.into(),
            reason: cause.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } | Self::AddAllFailed { .. } => {
                Some("Check that [origin] base_url in the config points at a reachable server")
            }
            Self::NotInstalled(_) => Some("Run: precache install"),
            Self::CorruptEntry { .. } => {
                Some("Remove the cache directory and run: precache install")
            }
            _ => None,
        }
    }
}
