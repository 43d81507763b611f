//! Install command - pre-cache the fixed URL list

use super::build_host;
use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;
use crate::worker::{CACHE_NAME, URLS_TO_CACHE};
use console::style;

/// Execute the install command
pub async fn execute(manager: &ConfigManager, config: &Config) -> PrecacheResult<()> {
    let host = build_host(manager, config)?;
    host.install().await?;

    println!(
        "{} {} ({} URLs from {})",
        style("[OK]").green(),
        CACHE_NAME,
        URLS_TO_CACHE.len(),
        host.worker().origin()
    );
    Ok(())
}
