//! In-process cache storage

use super::{Cache, CacheEntry, CacheStorage};
use crate::error::PrecacheResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache storage held in memory; caches live as long as the storage
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<RwLock<HashMap<String, Arc<MemoryCache>>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> PrecacheResult<Arc<dyn Cache>> {
        let mut caches = self.caches.write().await;
        let cache: Arc<dyn Cache> = caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCache::new(name)))
            .clone();
        Ok(cache)
    }

    async fn has(&self, name: &str) -> PrecacheResult<bool> {
        Ok(self.caches.read().await.contains_key(name))
    }

    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        let mut names: Vec<String> = self.caches.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// A cache held in memory
pub struct MemoryCache {
    name: String,
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl MemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &str) -> PrecacheResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn insert_new(&self, entries: Vec<CacheEntry>) -> PrecacheResult<usize> {
        let mut map = self.entries.write().await;
        let mut stored = 0;
        for entry in entries {
            if map.contains_key(&entry.url) {
                continue;
            }
            map.insert(entry.url.clone(), entry);
            stored += 1;
        }
        Ok(stored)
    }

    async fn entries(&self) -> PrecacheResult<Vec<CacheEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn len(&self) -> PrecacheResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
