//! Entries command - list what the worker has cached

use crate::cache::{CacheEntry, CacheStorage, DiskCacheStorage};
use crate::cli::args::{EntriesArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::{PrecacheError, PrecacheResult};
use crate::worker::CACHE_NAME;
use console::style;

/// Execute the entries command
pub async fn execute(args: EntriesArgs, config: &Config) -> PrecacheResult<()> {
    let storage = DiskCacheStorage::new(ConfigManager::caches_dir(config));
    if !storage.has(CACHE_NAME).await? {
        return Err(PrecacheError::NotInstalled(CACHE_NAME.to_string()));
    }

    let entries = storage.open(CACHE_NAME).await?.entries().await?;

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[CacheEntry]) {
    println!(
        "{:<50} {:<8} {:<10} {:<20}",
        style("URL").bold(),
        style("STATUS").bold(),
        style("SIZE").bold(),
        style("STORED").bold()
    );
    println!("{}", "-".repeat(90));

    for entry in entries {
        let stored = entry.stored_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<50} {:<8} {:<10} {:<20}",
            entry.url,
            entry.response.status,
            entry.response.body.len(),
            stored
        );
    }

    println!();
    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    println!("{} {} in {}", entries.len(), noun, CACHE_NAME);
}

fn print_json(entries: &[CacheEntry]) -> PrecacheResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        url: &'a str,
        status: u16,
        content_type: Option<&'a str>,
        size: usize,
        stored_at: String,
    }

    let json_entries: Vec<EntryJson> = entries
        .iter()
        .map(|e| EntryJson {
            url: &e.url,
            status: e.response.status,
            content_type: e.response.header("content-type"),
            size: e.response.body.len(),
            stored_at: e.stored_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn print_plain(entries: &[CacheEntry]) {
    for entry in entries {
        println!("{}", entry.url);
    }
}
