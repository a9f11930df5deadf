//! Repository layer for record persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a single SQLite connection.

pub mod diesel_models;
pub mod diesel_pool;
pub mod product;
pub mod sink;

pub use diesel_pool::{AsyncSqliteConnection, DieselError};
pub use product::{DieselProductSink, StoredProduct};
pub use sink::{RecordSink, SinkError};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
