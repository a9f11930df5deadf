//! Scrape command.

use std::sync::Arc;

use console::style;
use tracing::info;

use crate::config::Settings;
use crate::repository::DieselProductSink;
use crate::scrapers::{
    Fetcher, HttpClient, Pipeline, PipelineError, RunSummary, Shutdown, Sleeper, TokioSleeper,
};

/// Crawl the whole catalog into the configured database.
pub async fn cmd_scrape(settings: &Settings) -> anyhow::Result<()> {
    // Selector problems should stop us before any network traffic.
    let pipeline_config = settings.pipeline_config()?;
    settings.ensure_directories()?;

    let (shutdown, cancel) = Shutdown::new();
    let shutdown = Arc::new(shutdown);
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping...");
                shutdown.trigger();
            }
        });
    }

    let client = HttpClient::with_user_agent(
        settings.request_timeout(),
        settings.user_agent.as_deref(),
    )?;
    info!("Using user agent: {}", client.user_agent());

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let fetcher = Fetcher::new(
        Arc::new(client),
        sleeper.clone(),
        cancel.clone(),
        settings.retry_policy(),
    );
    let pipeline = Pipeline::new(fetcher, sleeper, cancel, pipeline_config);

    let database_url = settings.database_url();
    let mut sink = DieselProductSink::open(&database_url).await?;

    match pipeline.run_scoped(&mut sink).await {
        Ok(summary) => {
            print_summary(&summary);
            println!(
                "{} Scraping complete, records stored in {}",
                style("✓").green(),
                database_url
            );
            Ok(())
        }
        Err(PipelineError::Interrupted) => {
            println!("{} Interrupted", style("!").yellow());
            Err(PipelineError::Interrupted.into())
        }
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", style("Scrape Summary").bold());
    println!(
        "  Manufacturers: {} ({} skipped)",
        summary.manufacturers, summary.manufacturers_skipped
    );
    println!(
        "  Products:      {} attempted, {} saved, {} skipped",
        summary.products_attempted,
        style(summary.products_saved).green(),
        summary.products_skipped
    );
    if summary.persist_failures > 0 {
        println!(
            "  {} {} records could not be stored",
            style("!").yellow(),
            summary.persist_failures
        );
    }
}
