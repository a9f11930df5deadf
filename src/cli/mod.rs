//! CLI parser and entry point.

mod scrape;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "gsmacquire")]
#[command(about = "Phone catalog specification scraper")]
#[command(version)]
pub struct Cli {
    /// Config file (overrides auto-discovery)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Top-level catalog page listing manufacturers
    #[arg(long)]
    catalog_url: Option<String>,

    /// Database URL or path
    #[arg(long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Stop after attempting this many products (0 = unlimited)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Delay between product pages in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let mut settings = load_settings(&options).await?;

    if let Some(catalog_url) = cli.catalog_url {
        settings.catalog_url = catalog_url;
    }
    if let Some(database) = cli.database {
        settings.database_url = Some(database);
    }
    if let Some(limit) = cli.limit {
        settings.limit = limit;
    }
    if let Some(delay_ms) = cli.delay_ms {
        settings.request_delay_ms = delay_ms;
    }

    scrape::cmd_scrape(&settings).await
}
