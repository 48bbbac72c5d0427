use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::record::{MessageRecord, MessageStore};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "messages.db";
/// Default time a call waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    message TEXT NOT NULL
);";

/// SQLite-backed message history.
///
/// Holds no connection between calls. Each operation opens its own
/// connection and runs as a single implicit transaction, so the ingestion
/// writer and concurrent readers never share a handle. WAL journaling lets
/// reads proceed while a write is in progress; `AUTOINCREMENT` guarantees
/// identifiers are never reused.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open with an explicit busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout,
        };

        let conn = store.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;

        info!(path = ?store.path, journal_mode = %mode, "message store ready");
        Ok(store)
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of stored records.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl MessageStore for SqliteStore {
    fn append(&self, message: &str, timestamp: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO messages (timestamp, message) VALUES (?1, ?2)",
            params![timestamp, message],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, "message stored");
        Ok(id)
    }

    fn recent_records(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, timestamp, message FROM messages ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(MessageRecord {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                message: row.get(2)?,
            })
        })?;
        let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
