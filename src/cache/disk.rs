//! On-disk cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<cache name>/<sha256(url)[..16]>.json
//! ```
//!
//! Each file is one serialized `CacheEntry`. New entries are written to
//! `.tmp` files first and renamed into place once every write succeeded.

use super::{Cache, CacheEntry, CacheStorage};
use crate::error::{PrecacheError, PrecacheResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Cache storage persisted under a root directory
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Create storage rooted at `root`; the directory is created on first open
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cache_dir(&self, name: &str) -> PrecacheResult<PathBuf> {
        validate_cache_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Cache names become directory names, so keep them to a safe charset
fn validate_cache_name(name: &str) -> PrecacheResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(PrecacheError::Storage(format!(
            "invalid cache name '{}': use letters, digits, '-', '_' or '.'",
            name
        )))
    }
}

/// File name for a cache key: first 16 hex chars of its SHA256
fn entry_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}.json", hex::encode(&digest[..8]))
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> PrecacheResult<Arc<dyn Cache>> {
        let dir = self.cache_dir(name)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            PrecacheError::io(format!("creating cache directory {}", dir.display()), e)
        })?;

        Ok(Arc::new(DiskCache {
            name: name.to_string(),
            dir,
            write_lock: Mutex::new(()),
        }))
    }

    async fn has(&self, name: &str) -> PrecacheResult<bool> {
        Ok(self.cache_dir(name)?.is_dir())
    }

    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| PrecacheError::io("reading cache storage directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PrecacheError::io("reading cache storage entry", e))?
        {
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if validate_cache_name(name).is_ok() {
                        names.push(name.to_string());
                    }
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

/// A cache stored as a directory of JSON entries
pub struct DiskCache {
    name: String,
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DiskCache {
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(key))
    }

    async fn read_entry(path: &Path) -> PrecacheResult<CacheEntry> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            PrecacheError::io(format!("reading cache entry {}", path.display()), e)
        })?;

        serde_json::from_str(&content).map_err(|e| PrecacheError::CorruptEntry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    async fn discard(paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = fs::remove_file(path).await {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    /// Rename staged `(tmp, path)` pairs into place as one unit.
    ///
    /// If a rename fails, entries already renamed are removed and the
    /// remaining staged files are discarded, so the cache is left as it was.
    async fn commit(staged: Vec<(PathBuf, PathBuf)>) -> PrecacheResult<usize> {
        let mut committed: Vec<PathBuf> = vec![];
        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, path).await {
                Self::discard(&committed).await;
                let pending: Vec<PathBuf> = staged[i..]
                    .iter()
                    .map(|(t, _)| t.clone())
                    .filter(|t| t.exists())
                    .collect();
                Self::discard(&pending).await;
                return Err(PrecacheError::io(
                    format!("committing cache entry {}", path.display()),
                    e,
                ));
            }
            committed.push(path.clone());
        }
        Ok(committed.len())
    }
}

#[async_trait]
impl Cache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &str) -> PrecacheResult<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let entry = Self::read_entry(&path).await?;
        // Hash prefix collision: treat as absent
        if entry.url != key {
            debug!("{} holds {}, not {}", path.display(), entry.url, key);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn insert_new(&self, entries: Vec<CacheEntry>) -> PrecacheResult<usize> {
        let _guard = self.write_lock.lock().await;

        let mut staged: Vec<(PathBuf, PathBuf)> = vec![];
        for entry in entries {
            let path = self.entry_path(&entry.url);
            if path.exists() || staged.iter().any(|(_, p)| *p == path) {
                continue;
            }

            let tmp = path.with_extension("json.tmp");
            let content = serde_json::to_string_pretty(&entry)?;
            if let Err(e) = fs::write(&tmp, content).await {
                let mut written: Vec<PathBuf> = staged.into_iter().map(|(t, _)| t).collect();
                written.push(tmp.clone());
                Self::discard(&written).await;
                return Err(PrecacheError::io(
                    format!("writing cache entry {}", tmp.display()),
                    e,
                ));
            }
            staged.push((tmp, path));
        }

        let stored = Self::commit(staged).await?;
        debug!("Stored {} entries in {}", stored, self.dir.display());
        Ok(stored)
    }

    async fn entries(&self) -> PrecacheResult<Vec<CacheEntry>> {
        let mut entries = vec![];
        let mut dir = fs::read_dir(&self.dir).await.map_err(|e| {
            PrecacheError::io(format!("reading cache directory {}", self.dir.display()), e)
        })?;

        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| PrecacheError::io("reading cache directory entry", e))?
        {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                entries.push(Self::read_entry(&path).await?);
            }
        }

        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}
