//! SQLite storage backend
//!
//! Durable key/value storage in a single `cache_records` table. All access
//! goes through one mutex-guarded connection, matching the synchronous
//! local-read contract of the `StorageBackend` port.

use std::path::Path;
use std::time::Duration;

use fetchcache_core::StorageBackend;
use fetchcache_domain::{FetchCacheError, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS cache_records (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// File- or memory-backed SQLite backend
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(map_sqlite_error)?;
        configure(&conn).map_err(map_sqlite_error)?;
        tracing::debug!(path = %path.as_ref().display(), "sqlite cache backend opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open a private in-memory database (useful for tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        configure(&conn).map_err(map_sqlite_error)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

/// WAL keeps readers unblocked during writes; in-memory databases report
/// their own journal mode and are left as-is.
fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    conn.execute(CREATE_TABLE_SQL, [])?;
    Ok(())
}

fn map_sqlite_error(err: rusqlite::Error) -> FetchCacheError {
    FetchCacheError::Storage(err.to_string())
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row("SELECT value FROM cache_records WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(map_sqlite_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cache_records (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map(|_| ())
        .map_err(map_sqlite_error)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cache_records WHERE key = ?1", params![key])
            .map(|_| ())
            .map_err(map_sqlite_error)
    }
}
