//! Record sinks: where extracted product records go.

use async_trait::async_trait;
use thiserror::Error;

use super::diesel_pool::DieselError;
use crate::models::Record;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Sink is closed")]
    Closed,
}

/// Accepts one record at a time. Records carry no identity, so repeated runs
/// store duplicates.
#[async_trait]
pub trait RecordSink: Send {
    async fn put(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Release the underlying resource. Idempotent; `put` fails afterwards.
    async fn close(&mut self) -> Result<(), SinkError>;
}
