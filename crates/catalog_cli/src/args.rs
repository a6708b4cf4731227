use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Harvest product names and per-size prices from catalog collections.
/// Exit codes: 0=success, 1=harvest or setup failure
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
pub struct Cli {
    /// Collection page URLs, harvested in order
    #[arg(value_name = "COLLECTION_URL")]
    pub collection_urls: Vec<String>,

    #[arg(short, long, help = "RON file with default settings; flags override it")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Stop each collection after this many pages")]
    pub max_pages: Option<u32>,

    #[arg(long, help = "Stop each collection after this many products")]
    pub max_products: Option<usize>,

    #[arg(long, help = "Pause between product fetches, in milliseconds")]
    pub delay_ms: Option<u64>,

    #[arg(long, help = "Request timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Currency symbol for prices given in minor units")]
    pub currency: Option<String>,

    #[arg(short, long, help = "Where to write the catalog JSON [default: catalog.json]")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, help = "Log destination [default: terminal]")]
    pub log: Option<LogTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}
