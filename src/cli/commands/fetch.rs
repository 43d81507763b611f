//! Fetch command - route one request through the worker

use super::build_host;
use crate::cli::args::FetchArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{self, Request};
use crate::worker::FetchSource;
use console::style;
use std::io::{self, Write};
use tracing::warn;

/// Execute the fetch command
///
/// Installs first so an already-populated cache answers offline; an
/// install failure leaves the request to go straight to the network.
pub async fn execute(
    args: FetchArgs,
    manager: &ConfigManager,
    config: &Config,
) -> PrecacheResult<()> {
    let host = build_host(manager, config)?;

    if let Err(e) = host.install().await {
        warn!("Install failed, fetching without the worker: {}", e);
    }

    let url = http::resolve(host.worker().origin(), &args.path)?;
    let mut request = Request::new(&args.method, url);
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = args.data {
        request = request.with_body(data);
    }

    let served = host.fetch(&request).await?;
    let source = match served.source {
        FetchSource::Cache => style(served.source.to_string()).green(),
        FetchSource::Network => style(served.source.to_string()).yellow(),
    };

    eprintln!(
        "{} {} [{}]",
        served.response.status, served.response.status_text, source
    );

    if !args.head {
        io::stdout()
            .write_all(&served.response.body)
            .map_err(|e| PrecacheError::io("writing response body", e))?;
    }
    Ok(())
}

/// Split a `NAME: VALUE` header argument
fn parse_header(raw: &str) -> PrecacheResult<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        PrecacheError::User(format!("Invalid header '{}': expected NAME:VALUE", raw))
    })?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}
