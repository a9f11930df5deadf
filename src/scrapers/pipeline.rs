//! Sequential catalog crawl: catalog page, then each manufacturer listing,
//! then each product detail page, depth first.
//!
//! Failures below the catalog level skip the affected branch and the run
//! moves on to the next sibling. Only a failed catalog fetch or a shutdown
//! request ends the run early.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use super::cancel::{CancelToken, Interrupted, Sleeper};
use super::details::extract_details;
use super::fetcher::{FetchError, Fetcher};
use super::links::{extract_links, SelectorProfile};
use crate::models::{LinkRef, Record};
use crate::repository::RecordSink;

/// Default pause between product pages.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Reasons a run ends before visiting every manufacturer.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog page unavailable: {0}")]
    CatalogUnavailable(#[source] FetchError),
    #[error("run interrupted")]
    Interrupted,
}

impl From<Interrupted> for PipelineError {
    fn from(_: Interrupted) -> Self {
        PipelineError::Interrupted
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub manufacturers: usize,
    pub manufacturers_skipped: usize,
    pub products_attempted: usize,
    pub products_saved: usize,
    pub products_skipped: usize,
    pub persist_failures: usize,
}

/// What to crawl and how fast.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub catalog_url: String,
    pub manufacturers: SelectorProfile,
    pub products: SelectorProfile,
    pub request_delay: Duration,
    /// Stop after this many products have been attempted (0 = unlimited).
    pub limit: usize,
}

pub struct Pipeline {
    fetcher: Fetcher,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
    config: PipelineConfig,
}

enum Step {
    Continue,
    LimitReached,
}

impl Pipeline {
    pub fn new(
        fetcher: Fetcher,
        sleeper: Arc<dyn Sleeper>,
        cancel: CancelToken,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            cancel,
            config,
        }
    }

    /// Run the crawl, then close `sink` whatever the outcome.
    pub async fn run_scoped(&self, sink: &mut dyn RecordSink) -> Result<RunSummary, PipelineError> {
        let outcome = self.run(sink).await;
        if let Err(e) = sink.close().await {
            warn!("Failed to close record sink: {}", e);
        }
        outcome
    }

    /// Crawl the catalog, handing one record per extracted product to `sink`.
    pub async fn run(&self, sink: &mut dyn RecordSink) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        let catalog_url = &self.config.catalog_url;

        info!("Fetching catalog {}", catalog_url);
        let manufacturers = match self.fetcher.fetch(catalog_url).await {
            Ok(page) => extract_links(&page, &self.config.manufacturers),
            Err(FetchError::Interrupted) => return Err(PipelineError::Interrupted),
            Err(e) => {
                error!("Could not retrieve manufacturer links: {}", e);
                return Err(PipelineError::CatalogUnavailable(e));
            }
        };

        if manufacturers.is_empty() {
            warn!(
                "No manufacturer links matched '{}' on {}",
                self.config.manufacturers.css(),
                catalog_url
            );
        }

        for manufacturer in &manufacturers {
            summary.manufacturers += 1;
            info!(
                "Scraping manufacturer: {} ({})",
                manufacturer.label, manufacturer.target_url
            );

            let Some(products) = self.product_links(manufacturer).await? else {
                warn!(
                    "Skipping manufacturer {} due to link retrieval error",
                    manufacturer.label
                );
                summary.manufacturers_skipped += 1;
                continue;
            };

            for product in &products {
                if let Step::LimitReached = self
                    .process_product(&manufacturer.label, product, sink, &mut summary)
                    .await?
                {
                    info!("Reached limit of {} products", self.config.limit);
                    return Ok(summary);
                }

                self.cancel
                    .wait(self.sleeper.as_ref(), self.config.request_delay)
                    .await?;
            }
        }

        info!(
            "Scraping complete: {} saved, {} skipped",
            summary.products_saved, summary.products_skipped
        );
        Ok(summary)
    }

    /// Product links of one manufacturer, or `None` if the listing could not
    /// be used. A fetch failure and a page without matching links are both
    /// reported as a skip.
    async fn product_links(&self, manufacturer: &LinkRef) -> Result<Option<Vec<LinkRef>>, PipelineError> {
        let links = match self.fetcher.fetch(&manufacturer.target_url).await {
            Ok(page) => extract_links(&page, &self.config.products),
            Err(FetchError::Interrupted) => return Err(PipelineError::Interrupted),
            Err(e) => {
                warn!("Failed to fetch {}: {}", manufacturer.target_url, e);
                return Ok(None);
            }
        };

        if links.is_empty() {
            warn!(
                "No product links matched '{}' on {}",
                self.config.products.css(),
                manufacturer.target_url
            );
            return Ok(None);
        }
        Ok(Some(links))
    }

    async fn process_product(
        &self,
        manufacturer: &str,
        product: &LinkRef,
        sink: &mut dyn RecordSink,
        summary: &mut RunSummary,
    ) -> Result<Step, PipelineError> {
        summary.products_attempted += 1;
        info!("  Scraping product: {} ({})", product.label, product.target_url);

        match self.extract_record(manufacturer, product).await? {
            Some(record) => {
                self.cancel.check()?;
                match sink.put(&record).await {
                    Ok(()) => {
                        summary.products_saved += 1;
                        info!("    Saved {}", product.label);
                    }
                    Err(e) => {
                        summary.persist_failures += 1;
                        warn!("    Failed to save {}: {}", product.label, e);
                    }
                }
            }
            None => summary.products_skipped += 1,
        }

        if self.config.limit > 0 && summary.products_attempted >= self.config.limit {
            Ok(Step::LimitReached)
        } else {
            Ok(Step::Continue)
        }
    }

    async fn extract_record(
        &self,
        manufacturer: &str,
        product: &LinkRef,
    ) -> Result<Option<Record>, PipelineError> {
        let specs = match self.fetcher.fetch(&product.target_url).await {
            Ok(page) => extract_details(&page),
            Err(FetchError::Interrupted) => return Err(PipelineError::Interrupted),
            Err(e) => {
                warn!("    Failed to extract details for {}: {}", product.label, e);
                return Ok(None);
            }
        };

        if specs.is_empty() {
            warn!("    No specifications found for {}", product.label);
            return Ok(None);
        }

        Ok(Some(Record::new(manufacturer, product, specs)))
    }
}
