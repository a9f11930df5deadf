//! Cooperative cancellation and injectable waits.
//!
//! Every blocking point in a run (retry backoff, pacing delay, in-flight
//! request) races against a shared shutdown flag so an interrupt stops the
//! whole run at the next await.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Returned when a wait or request is abandoned because shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interrupted by shutdown request")]
pub struct Interrupted;

/// Source of delays. Production code sleeps on the tokio timer; tests inject
/// fakes that record durations without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sending half of the shutdown flag.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a shutdown handle and the token observed by the run.
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx })
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observing half of the shutdown flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never be triggered.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Fail fast if shutdown was already requested.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    /// Resolve once shutdown is requested. Never resolves if the sending
    /// half is gone without having triggered.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Wait for `duration` on `sleeper`, abandoning the wait on shutdown.
    pub async fn wait(&self, sleeper: &dyn Sleeper, duration: Duration) -> Result<(), Interrupted> {
        self.check()?;
        tokio::select! {
            _ = self.cancelled() => Err(Interrupted),
            _ = sleeper.sleep(duration) => Ok(()),
        }
    }

    /// Drive `fut` to completion unless shutdown is requested first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;
        tokio::select! {
            _ = self.cancelled() => Err(Interrupted),
            out = fut => Ok(out),
        }
    }
}
