mod args;
mod config;
mod logging;
mod report;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use catalog_core::StatusBoard;
use catalog_engine::{write_catalog, Harvester};
use catalog_logging::{catalog_error, catalog_info};
use clap::Parser;

use crate::args::Cli;
use crate::config::{CliConfig, RunSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            catalog_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let settings = RunSettings::resolve(&cli, file_config)?;
    logging::initialize(settings.log);
    catalog_info!(
        "Starting harvest of {} collections",
        settings.collection_urls.len()
    );

    let harvester = Harvester::with_http(settings.harvest, StatusBoard::new());
    let result = harvester.harvest(&settings.collection_urls).await?;

    let dir = settings
        .output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = settings
        .output
        .file_name()
        .and_then(|name| name.to_str())
        .context("output path has no file name")?;
    let written = write_catalog(dir, filename, &result)
        .with_context(|| format!("failed to write {}", settings.output.display()))?;

    report::log_summary(&result, &written);
    Ok(())
}
