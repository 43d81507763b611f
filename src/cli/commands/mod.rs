//! CLI command implementations

pub mod config;
pub mod entries;
pub mod fetch;
pub mod install;

pub use config::execute as config;
pub use entries::execute as entries;
pub use fetch::execute as fetch;
pub use install::execute as install;

use crate::cache::DiskCacheStorage;
use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;
use crate::host::WorkerHost;
use crate::network::UreqNetwork;
use crate::worker::ServiceWorker;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build a host for the configured origin, backed by the on-disk caches
pub(crate) fn build_host(manager: &ConfigManager, config: &Config) -> PrecacheResult<WorkerHost> {
    let origin = manager.origin(config)?;
    let caches_dir = ConfigManager::caches_dir(config);
    debug!("Using caches in {}", caches_dir.display());

    let worker = ServiceWorker::new(
        origin,
        Arc::new(DiskCacheStorage::new(caches_dir)),
        Arc::new(UreqNetwork::new(Duration::from_secs(config.origin.timeout_secs))),
    );
    Ok(WorkerHost::new(worker))
}
