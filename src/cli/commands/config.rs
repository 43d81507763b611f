//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;
use console::style;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> PrecacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }
    Ok(())
}

fn show_config(config: &Config) -> PrecacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    println!("# caches: {}", ConfigManager::caches_dir(config).display());
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> PrecacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        eprintln!(
            "{} Config already exists at {}",
            style("[SKIP]").yellow(),
            path.display()
        );
        eprintln!("{} Use --force to overwrite", style("Hint:").cyan());
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("[OK]").green(),
        path.display()
    );
    Ok(())
}
