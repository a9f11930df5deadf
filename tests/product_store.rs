//! Product Store Tests
//!
//! Verifies the on-disk layout written by the diesel product sink, reading it
//! back with an independent SQLite driver.

use std::collections::BTreeMap;

use rusqlite::{Connection, Result as SqliteResult};

use gsmacquire::models::{LinkRef, Record, SpecMap};
use gsmacquire::repository::{DieselProductSink, RecordSink};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    col_type: String,
    not_null: bool,
    primary_key: bool,
}

fn extract_columns(conn: &Connection, table: &str) -> SqliteResult<BTreeMap<String, ColumnInfo>> {
    let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let rows = pragma.query_map([], |row| {
        Ok((
            row.get::<_, String>(1)?,
            ColumnInfo {
                col_type: row.get::<_, String>(2)?.to_uppercase(),
                not_null: row.get(3)?,
                primary_key: row.get::<_, i32>(5)? > 0,
            },
        ))
    })?;
    rows.collect()
}

fn sample_record() -> Record {
    let link = LinkRef::new("Acme X1", "https://site.test/acme_x1-1.php");
    let specs: SpecMap = [
        ("phone_name", "Acme X1"),
        ("display_type", "AMOLED"),
        ("battery_type", "Li-Ion 5000 mAh"),
    ]
    .into_iter()
    .collect();
    Record::new("Acme", &link, specs)
}

#[tokio::test]
async fn products_table_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("schema.db");

    let mut sink = DieselProductSink::open(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();
    sink.close().await.unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let columns = extract_columns(&conn, "products").unwrap();

    let names: Vec<&str> = columns.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["id", "manufacturer", "model", "scraped_at", "specifications", "url"]
    );
    assert!(columns["id"].primary_key);
    assert_eq!(columns["id"].col_type, "INTEGER");
    for name in ["manufacturer", "model", "url", "specifications", "scraped_at"] {
        assert_eq!(columns[name].col_type, "TEXT", "column {}", name);
        assert!(columns[name].not_null, "column {}", name);
    }
}

#[tokio::test]
async fn stored_row_matches_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rows.db");

    let mut sink = DieselProductSink::open(&db_path.display().to_string())
        .await
        .unwrap();
    let record = sample_record();
    sink.put(&record).await.unwrap();
    sink.close().await.unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let (manufacturer, model, url, specifications, scraped_at): (
        String,
        String,
        String,
        String,
        String,
    ) = conn
        .query_row(
            "SELECT manufacturer, model, url, specifications, scraped_at FROM products",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .unwrap();

    assert_eq!(manufacturer, "Acme");
    assert_eq!(model, "Acme X1");
    assert_eq!(url, "https://site.test/acme_x1-1.php");
    assert!(chrono::DateTime::parse_from_rfc3339(&scraped_at).is_ok());

    let specs: serde_json::Value = serde_json::from_str(&specifications).unwrap();
    assert_eq!(
        specs,
        serde_json::json!({
            "battery_type": "Li-Ion 5000 mAh",
            "display_type": "AMOLED",
            "phone_name": "Acme X1",
        })
    );

    // The logical document carries the same map.
    let document = serde_json::to_value(record.to_document()).unwrap();
    assert_eq!(document["specifications"], specs);
    assert_eq!(document["model"], "Acme X1");
}
