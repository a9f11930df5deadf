//! Page fetching with linear retry backoff.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::cancel::{CancelToken, Interrupted, Sleeper};
use super::http_client::{Transport, TransportError};
use super::page::Page;

/// Default number of attempts per page.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; attempt `n` is followed by a wait of `n * base`.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// A fetch that did not produce a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: TransportError,
    },
    #[error("fetch interrupted")]
    Interrupted,
}

impl FetchError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, FetchError::Interrupted)
    }
}

impl From<Interrupted> for FetchError {
    fn from(_: Interrupted) -> Self {
        FetchError::Interrupted
    }
}

/// Retry budget for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Wait applied after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Fetches and parses pages, retrying transient transport failures.
///
/// Nothing is cached: every call goes back to the transport.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        cancel: CancelToken,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            cancel,
            policy,
        }
    }

    /// Fetch `url` and parse it into a page.
    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "not an absolute hierarchical URL".to_string(),
            });
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("Fetching {} (attempt {}/{})", url, attempt, max_attempts);

            let result = self.cancel.run(self.transport.get_text(&parsed)).await?;
            let error = match result {
                Ok(body) => return Ok(Page::parse(parsed, &body)),
                Err(e) => e,
            };

            warn!(
                "Error fetching {} (attempt {}/{}): {}",
                url, attempt, max_attempts, error
            );

            if attempt >= max_attempts {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.policy.delay_after(attempt);
            self.cancel.wait(self.sleeper.as_ref(), delay).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::cancel::Shutdown;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails a fixed number of times, then serves a page.
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyTransport {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get_text(&self, _url: &Url) -> Result<String, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(TransportError::Connect("connection reset".to_string()))
            } else {
                Ok("<h1 class=\"specs-phone-name\">X</h1>".to_string())
            }
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    /// Triggers shutdown the first time it is asked to wait.
    struct InterruptingSleeper {
        shutdown: Shutdown,
    }

    #[async_trait]
    impl Sleeper for InterruptingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.shutdown.trigger();
            std::future::pending::<()>().await;
        }
    }

    fn fetcher(transport: Arc<FlakyTransport>, sleeper: Arc<dyn Sleeper>) -> Fetcher {
        Fetcher::new(transport, sleeper, CancelToken::never(), RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let transport = Arc::new(FlakyTransport::new(2));
        let sleeper = Arc::new(RecordingSleeper::default());
        let page = fetcher(transport.clone(), sleeper.clone())
            .fetch("https://example.com/a.php")
            .await
            .unwrap();

        assert_eq!(page.url().as_str(), "https://example.com/a.php");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let transport = Arc::new(FlakyTransport::new(u32::MAX));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = fetcher(transport.clone(), sleeper.clone())
            .fetch("https://example.com/a.php")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        // No wait after the final attempt.
        assert_eq!(sleeper.waits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_relative_url_without_attempting() {
        let transport = Arc::new(FlakyTransport::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = fetcher(transport.clone(), sleeper)
            .fetch("/makers.php3")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interrupt_during_backoff() {
        let (shutdown, token) = Shutdown::new();
        let transport = Arc::new(FlakyTransport::new(u32::MAX));
        let sleeper = Arc::new(InterruptingSleeper { shutdown });
        let fetcher = Fetcher::new(transport.clone(), sleeper, token, RetryPolicy::default());

        let err = fetcher.fetch("https://example.com/a.php").await.unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    /// Requests shutdown mid-request and never answers.
    struct HangingTransport {
        shutdown: Shutdown,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn get_text(&self, _url: &Url) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.shutdown.trigger();
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_interrupt_during_attempt() {
        let (shutdown, token) = Shutdown::new();
        let transport = Arc::new(HangingTransport {
            shutdown,
            calls: AtomicU32::new(0),
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let fetcher = Fetcher::new(transport.clone(), sleeper.clone(), token, RetryPolicy::default());

        let err = tokio::time::timeout(
            Duration::from_secs(2),
            fetcher.fetch("https://example.com/a.php"),
        )
        .await
        .expect("in-flight request was not abandoned")
        .unwrap_err();

        assert!(err.is_interrupted());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_attempt_after_shutdown() {
        let (shutdown, token) = Shutdown::new();
        shutdown.trigger();
        let transport = Arc::new(FlakyTransport::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());
        let fetcher = Fetcher::new(transport.clone(), sleeper, token, RetryPolicy::default());

        let err = fetcher.fetch("https://example.com/a.php").await.unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }
}
