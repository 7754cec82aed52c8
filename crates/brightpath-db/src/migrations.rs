use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            identity      TEXT NOT NULL UNIQUE,
            display_name  TEXT,
            password      TEXT NOT NULL,
            role          TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS moods (
            id            TEXT PRIMARY KEY,
            owner         TEXT,
            mood          TEXT NOT NULL,
            stress_level  REAL,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_moods_owner
            ON moods(owner, created_at);

        CREATE TABLE IF NOT EXISTS journals (
            id          TEXT PRIMARY KEY,
            owner       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_journals_owner
            ON journals(owner, created_at);

        -- No owner column: confessions are anonymous.
        CREATE TABLE IF NOT EXISTS confessions (
            id          TEXT PRIMARY KEY,
            message     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS feedback (
            id          TEXT PRIMARY KEY,
            owner       TEXT,
            message     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY,
            identity    TEXT NOT NULL,
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expiry
            ON sessions(expires_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

/// Newest creation stamp across all entry tables, used to seed the
/// monotonic stamp after a restart.
pub fn latest_stamp(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let max: Option<String> = conn.query_row(
        "SELECT MAX(created_at) FROM (
             SELECT created_at FROM users
             UNION ALL SELECT created_at FROM moods
             UNION ALL SELECT created_at FROM journals
             UNION ALL SELECT created_at FROM confessions
             UNION ALL SELECT created_at FROM feedback
         )",
        [],
        |row| row.get(0),
    )?;

    max.as_deref().map(crate::parse_stamp).transpose()
}
