//! Catalog scraping: fetching, link discovery, detail extraction, and the
//! sequential driver that ties them together.

pub mod cancel;
pub mod details;
pub mod fetcher;
pub mod http_client;
pub mod links;
pub mod page;
pub mod pipeline;

pub use cancel::{CancelToken, Interrupted, Shutdown, Sleeper, TokioSleeper};
pub use details::extract_details;
pub use fetcher::{FetchError, Fetcher, RetryPolicy};
pub use http_client::{HttpClient, Transport, TransportError};
pub use links::{extract_links, SelectorError, SelectorProfile, SelectorProfileConfig};
pub use page::Page;
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, RunSummary};
