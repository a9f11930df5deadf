//! Diesel async connection management for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! for SQLite. A run holds exactly one connection for its whole lifetime.

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Async SQLite connection using SyncConnectionWrapper.
pub type AsyncSqliteConnection = SyncConnectionWrapper<SqliteConnection>;

/// Strip an optional `sqlite:` scheme so diesel gets a plain path.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Open a connection to the SQLite database at `database_url`, creating the
/// file if needed.
pub async fn establish(database_url: &str) -> Result<AsyncSqliteConnection, diesel::ConnectionError> {
    AsyncSqliteConnection::establish(sqlite_path(database_url)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_path_prefixes() {
        assert_eq!(sqlite_path("sqlite:/tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path("sqlite:///tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path("/tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }
}
