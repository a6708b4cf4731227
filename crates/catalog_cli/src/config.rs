//! Run settings: an optional RON file, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use catalog_core::CURRENCY_SYMBOLS;
use catalog_engine::{HarvestConfig, PageLimits};
use serde::Deserialize;

use crate::args::{Cli, LogTarget};

const DEFAULT_OUTPUT: &str = "catalog.json";

/// Contents of a `--config` file. Every field is optional.
///
/// ```ron
/// (
///     collection_urls: ["https://shop.example/collections/hair-care"],
///     max_pages: Some(5),
///     delay_ms: Some(1500),
///     currency: Some("€"),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub collection_urls: Vec<String>,
    pub max_pages: Option<u32>,
    pub max_products: Option<usize>,
    pub delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub currency: Option<String>,
    pub output: Option<PathBuf>,
    pub log: Option<LogTarget>,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[derive(Debug)]
pub struct RunSettings {
    pub collection_urls: Vec<String>,
    pub harvest: HarvestConfig,
    pub output: PathBuf,
    pub log: LogTarget,
}

impl RunSettings {
    pub fn resolve(cli: &Cli, file: CliConfig) -> anyhow::Result<Self> {
        let collection_urls = if cli.collection_urls.is_empty() {
            file.collection_urls
        } else {
            cli.collection_urls.clone()
        };
        if collection_urls.is_empty() {
            bail!("no collection urls given on the command line or in the config file");
        }

        let mut harvest = HarvestConfig {
            limits: PageLimits {
                max_pages: cli.max_pages.or(file.max_pages),
                max_products: cli.max_products.or(file.max_products),
            },
            ..HarvestConfig::default()
        };
        if let Some(delay_ms) = cli.delay_ms.or(file.delay_ms) {
            harvest.politeness_delay = Duration::from_millis(delay_ms);
        }
        if let Some(timeout_secs) = cli.timeout_secs.or(file.timeout_secs) {
            harvest.fetch.request_timeout = Duration::from_secs(timeout_secs);
        }
        if let Some(currency) = cli.currency.clone().or(file.currency) {
            harvest.currency_symbol = validate_currency(&currency)?;
        }

        Ok(Self {
            collection_urls,
            harvest,
            output: cli
                .output
                .clone()
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            log: cli.log.or(file.log).unwrap_or(LogTarget::Terminal),
        })
    }
}

fn validate_currency(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) if CURRENCY_SYMBOLS.contains(&symbol) => Ok(symbol.to_string()),
        _ => bail!(
            "unsupported currency symbol {:?}; expected one of {}",
            raw,
            CURRENCY_SYMBOLS.iter().collect::<String>()
        ),
    }
}
