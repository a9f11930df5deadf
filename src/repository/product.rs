//! Diesel-backed product store for SQLite.
//!
//! Each record becomes one row; the specification map is stored as a JSON
//! object so the row mirrors the logical product document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::info;

use super::diesel_models::{NewProduct, ProductRecord};
use super::diesel_pool::{establish, AsyncSqliteConnection};
use super::parse_datetime;
use super::sink::{RecordSink, SinkError};
use crate::models::{ProductDocument, Record};
use crate::schema::products;

const CREATE_PRODUCTS: &str = r#"CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer TEXT NOT NULL,
    model TEXT NOT NULL,
    url TEXT NOT NULL,
    specifications TEXT NOT NULL DEFAULT '{}',
    scraped_at TEXT NOT NULL
)"#;

/// A stored product document with its row metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub id: i32,
    pub document: ProductDocument,
    pub scraped_at: DateTime<Utc>,
}

impl TryFrom<ProductRecord> for StoredProduct {
    type Error = serde_json::Error;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Ok(StoredProduct {
            id: record.id,
            document: ProductDocument {
                manufacturer: record.manufacturer,
                model: record.model,
                url: record.url,
                specifications: serde_json::from_str(&record.specifications)?,
            },
            scraped_at: parse_datetime(&record.scraped_at),
        })
    }
}

/// Product sink holding a single long-lived SQLite connection.
pub struct DieselProductSink {
    conn: Option<AsyncSqliteConnection>,
}

impl DieselProductSink {
    /// Connect to the database and make sure the products table exists.
    pub async fn open(database_url: &str) -> Result<Self, SinkError> {
        let mut conn = establish(database_url).await?;
        conn.batch_execute(CREATE_PRODUCTS).await?;
        info!("Connected to product store: {}", database_url);

        Ok(Self { conn: Some(conn) })
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&mut self) -> Result<&mut AsyncSqliteConnection, SinkError> {
        self.conn.as_mut().ok_or(SinkError::Closed)
    }

    /// Number of stored products.
    pub async fn count(&mut self) -> Result<i64, SinkError> {
        let conn = self.conn()?;
        let count = products::table.count().get_result::<i64>(conn).await?;
        Ok(count)
    }

    /// All stored products in insertion order.
    pub async fn list(&mut self) -> Result<Vec<StoredProduct>, SinkError> {
        let conn = self.conn()?;
        let records = products::table
            .order(products::id.asc())
            .load::<ProductRecord>(conn)
            .await?;

        records
            .into_iter()
            .map(|r| StoredProduct::try_from(r).map_err(SinkError::from))
            .collect()
    }
}

#[async_trait]
impl RecordSink for DieselProductSink {
    async fn put(&mut self, record: &Record) -> Result<(), SinkError> {
        let specifications = serde_json::to_string(record.specs())?;
        let scraped_at = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        diesel::insert_into(products::table)
            .values(NewProduct {
                manufacturer: record.manufacturer(),
                model: record.product(),
                url: record.source_url(),
                specifications: &specifications,
                scraped_at: &scraped_at,
            })
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            info!("Database connection closed.");
        }
        Ok(())
    }
}
