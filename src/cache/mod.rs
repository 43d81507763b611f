//! Named response caches
//!
//! A `CacheStorage` hands out named `Cache` stores keyed by request URL.
//! Caches are populated once through `add_all` and only read afterwards.
//!
//! # Matching
//!
//! | Request | Stored entry | Result |
//! |---------|--------------|--------|
//! | non-GET | any | miss |
//! | GET, same URL (fragment ignored) | no `Vary` | hit |
//! | GET, same URL | `Vary: h1, h2` | hit if h1, h2 equal |
//! | GET, same URL | `Vary: *` | miss |
//!
//! # Backends
//!
//! - [`MemoryCacheStorage`]: process-local maps
//! - [`DiskCacheStorage`]: one directory per cache, one JSON file per entry

pub mod disk;
pub mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{self, Headers, Request, Response};
use crate::network::Network;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A stored request/response pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key (request URL without fragment)
    pub url: String,

    /// Headers of the request the response was fetched for
    pub request_headers: Headers,

    /// The stored response
    pub response: Response,

    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry for a fetched response
    pub fn new(request: &Request, response: Response) -> Self {
        Self {
            url: request.cache_key(),
            request_headers: request.headers.clone(),
            response,
            stored_at: Utc::now(),
        }
    }

    /// Check whether this entry answers `request`
    pub fn matches(&self, request: &Request) -> bool {
        if !request.is_get() || request.cache_key() != self.url {
            return false;
        }
        let vary = http::get_all_headers("vary", &self.response.headers).join(",");
        http::vary_header_matches(&vary, &request.headers, &self.request_headers)
    }
}

/// Set of named caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a cache by name, creating it if absent
    async fn open(&self, name: &str) -> PrecacheResult<Arc<dyn Cache>>;

    /// Check whether a cache with this name exists
    async fn has(&self, name: &str) -> PrecacheResult<bool>;

    /// Names of all existing caches, sorted
    async fn keys(&self) -> PrecacheResult<Vec<String>>;

    /// Find the stored response for a request in the named cache.
    ///
    /// A cache that does not exist is a miss and is not created.
    async fn match_in(&self, name: &str, request: &Request) -> PrecacheResult<Option<Response>> {
        if !self.has(name).await? {
            return Ok(None);
        }
        self.open(name).await?.match_request(request).await
    }
}

/// A single named cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Name the cache was opened with
    fn name(&self) -> &str;

    /// Get the entry stored under a key
    async fn lookup(&self, key: &str) -> PrecacheResult<Option<CacheEntry>>;

    /// Store entries whose keys are not present yet.
    ///
    /// Existing keys are left untouched. Returns the number of entries
    /// actually stored.
    async fn insert_new(&self, entries: Vec<CacheEntry>) -> PrecacheResult<usize>;

    /// All stored entries, sorted by key
    async fn entries(&self) -> PrecacheResult<Vec<CacheEntry>>;

    /// Number of stored entries
    async fn len(&self) -> PrecacheResult<usize> {
        Ok(self.entries().await?.len())
    }

    /// Check whether the cache holds no entries
    async fn is_empty(&self) -> PrecacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Find the stored response for a request
    async fn match_request(&self, request: &Request) -> PrecacheResult<Option<Response>> {
        if !request.is_get() {
            return Ok(None);
        }
        let entry = self.lookup(&request.cache_key()).await?;
        Ok(entry
            .filter(|entry| entry.matches(request))
            .map(|entry| entry.response))
    }

    /// Fetch every URL and store the responses as one unit.
    ///
    /// URLs already present are neither fetched nor overwritten. The
    /// remaining URLs are fetched concurrently; if any fetch fails or
    /// returns a non-2xx status, nothing is stored and the error is
    /// returned. Returns the number of entries stored.
    async fn add_all(&self, network: &dyn Network, urls: &[Url]) -> PrecacheResult<usize> {
        let mut pending: Vec<Request> = Vec::new();
        for url in urls {
            let key = http::cache_key(url);
            if self.lookup(&key).await?.is_some() {
                debug!("{} already cached in {}", key, self.name());
                continue;
            }
            if pending.iter().any(|r| r.cache_key() == key) {
                continue;
            }
            pending.push(Request::get(url.clone()));
        }

        if pending.is_empty() {
            return Ok(0);
        }

        let fetches = pending.iter().map(|request| async move {
            let url = request.url.as_str();
            let response = network
                .fetch(request)
                .await
                .map_err(|e| PrecacheError::add_all_failed(url, &e))?;
            if !response.is_ok() {
                let cause = PrecacheError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                };
                return Err(PrecacheError::add_all_failed(url, &cause));
            }
            Ok::<_, PrecacheError>(CacheEntry::new(request, response))
        });

        let entries = try_join_all(fetches).await?;
        self.insert_new(entries).await
    }
}
