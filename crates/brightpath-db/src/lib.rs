pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use models::{MoodFilter, SessionRow, UserInsert, UserRow};

pub struct Database {
    conn: Mutex<Connection>,
    // Last creation stamp handed out. Only touched while `conn` is held.
    last_stamp: Mutex<DateTime<Utc>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::run(&conn)?;
        let last_stamp = migrations::latest_stamp(&conn)?.unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(Self {
            conn: Mutex::new(conn),
            last_stamp: Mutex::new(last_stamp),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Runs `f` with the connection and a fresh creation stamp that is never
    /// earlier than any stamp handed out before it.
    pub(crate) fn with_stamp<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, DateTime<Utc>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let mut last = self
                .last_stamp
                .lock()
                .map_err(|e| anyhow::anyhow!("Stamp lock poisoned: {}", e))?;
            let now = truncate_stamp(Utc::now())?;
            let stamp = now.max(*last);
            *last = stamp;
            drop(last);
            f(conn, stamp)
        })
    }
}

/// Fixed-width RFC 3339 so lexical order in SQLite is chronological order.
pub(crate) fn format_stamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_stamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Drops precision below what is persisted, so in-memory values compare
/// equal to the ones read back.
pub(crate) fn truncate_stamp(ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
    parse_stamp(&format_stamp(ts))
}
