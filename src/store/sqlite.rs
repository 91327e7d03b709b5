//! SQLite-backed visit store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{RequestStore, Visit};
use crate::error::{CodepulseError, Result};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS reqs (
    name TEXT NOT NULL,
    remote_addr TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

/// Stores visits in the `reqs` table of a SQLite database.
///
/// The connection is used from blocking tasks only.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Database connected");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(CREATE_TABLE, [])?;
        debug!("Table reqs ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// All stored visits in insertion order.
    pub async fn visits(&self) -> Result<Vec<Visit>> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn.prepare("SELECT name, remote_addr FROM reqs ORDER BY rowid")?;
            let rows = stmt.query_map([], |row| {
                Ok(Visit {
                    name: row.get(0)?,
                    remote_addr: row.get(1)?,
                })
            })?;
            let visits = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(visits)
        })
        .await
    }
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn record_visit(&self, name: &str, remote_addr: &str) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let name = name.to_string();
        let remote_addr = remote_addr.to_string();

        run_blocking(move || {
            conn.lock().execute(
                "INSERT INTO reqs (name, remote_addr, created_at) VALUES (?1, ?2, ?3)",
                params![name, remote_addr, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CodepulseError::Server(format!("Store task failed: {}", e)))?
}
