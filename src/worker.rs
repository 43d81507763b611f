//! The offline pre-cache worker
//!
//! Two handlers: `on_install` fills the named cache from a fixed URL list,
//! `on_fetch` answers requests from that cache and falls back to the
//! network. The cache is never written after install.

use crate::cache::CacheStorage;
use crate::error::PrecacheResult;
use crate::http::{self, Request, Response};
use crate::network::Network;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Name of the cache store the worker owns
pub const CACHE_NAME: &str = "gestione-spese-cache-v1";

/// Resources pre-cached at install time, relative to the origin
pub const URLS_TO_CACHE: &[&str] = &["/", "/static/style.css"];

/// Where a fetched response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Cache,
    Network,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A response together with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub source: FetchSource,
    pub response: Response,
}

/// Install and fetch handlers bound to an origin and its host services
#[derive(Clone)]
pub struct ServiceWorker {
    origin: Url,
    caches: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl ServiceWorker {
    /// Create a worker scoped to `origin`
    pub fn new(origin: Url, caches: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            origin,
            caches,
            network,
        }
    }

    /// Origin the worker is scoped to
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Network the worker falls back to
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Absolute URLs of the pre-cache list, in order
    pub fn precache_urls(&self) -> PrecacheResult<Vec<Url>> {
        URLS_TO_CACHE
            .iter()
            .map(|path| http::resolve(&self.origin, path))
            .collect()
    }

    /// Install handler: open the cache and pre-cache every URL.
    ///
    /// Fails as a whole if any URL cannot be fetched.
    pub async fn on_install(&self) -> PrecacheResult<()> {
        let urls = self.precache_urls()?;
        let cache = self.caches.open(CACHE_NAME).await?;
        info!("Opened cache");

        let stored = cache.add_all(self.network.as_ref(), &urls).await?;
        debug!("Pre-cached {} of {} URLs in {}", stored, urls.len(), CACHE_NAME);
        Ok(())
    }

    /// Fetch handler: the cached response on a hit, the network's otherwise
    pub async fn on_fetch(&self, request: &Request) -> PrecacheResult<Response> {
        Ok(self.respond(request).await?.response)
    }

    /// Like `on_fetch`, also reporting where the response came from.
    ///
    /// Only reads storage; a cache that was never installed is a miss.
    pub async fn respond(&self, request: &Request) -> PrecacheResult<Served> {
        if let Some(response) = self.caches.match_in(CACHE_NAME, request).await? {
            debug!("cache hit: {} {}", request.method, request.url);
            return Ok(Served {
                source: FetchSource::Cache,
                response,
            });
        }

        debug!("cache miss: {} {}", request.method, request.url);
        let response = self.network.fetch(request).await?;
        Ok(Served {
            source: FetchSource::Network,
            response,
        })
    }
}
