use crate::models::{MoodFilter, SessionRow, UserInsert, UserRow};
use crate::{Database, format_stamp, truncate_stamp};
use anyhow::Result;
use brightpath_types::models::{Confession, Feedback, JournalEntry, MoodEntry, Role};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use uuid::Uuid;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        identity: &str,
        display_name: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> Result<UserInsert> {
        self.with_stamp(|conn, stamp| {
            let res = conn.execute(
                "INSERT INTO users (id, identity, display_name, password, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    identity,
                    display_name,
                    password_hash,
                    role.as_str(),
                    format_stamp(stamp),
                ],
            );
            match res {
                Ok(_) => Ok(UserInsert::Created),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(UserInsert::Duplicate)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Seeds `identity` as an admin, or promotes the existing account and
    /// resets its password. Any sessions it already holds are revoked.
    /// Returns true when the account was newly created.
    pub fn upsert_admin(&self, identity: &str, password_hash: &str) -> Result<bool> {
        self.with_stamp(|conn, stamp| {
            let existed = query_user_by_identity(conn, identity)?.is_some();
            conn.execute(
                "INSERT INTO users (id, identity, display_name, password, role, created_at)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5)
                 ON CONFLICT(identity) DO UPDATE SET password = excluded.password, role = excluded.role",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    identity,
                    password_hash,
                    Role::Admin.as_str(),
                    format_stamp(stamp),
                ],
            )?;
            conn.execute("DELETE FROM sessions WHERE identity = ?1", [identity])?;
            Ok(!existed)
        })
    }

    pub fn get_user_by_identity(&self, identity: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_identity(conn, identity))
    }

    // -- Entries --

    pub fn insert_mood(
        &self,
        owner: Option<&str>,
        mood: &str,
        stress_level: Option<f64>,
    ) -> Result<MoodEntry> {
        self.with_stamp(|conn, stamp| {
            let entry = MoodEntry {
                id: Uuid::new_v4(),
                owner: owner.map(str::to_string),
                mood: mood.to_string(),
                stress_level,
                created_at: stamp,
            };
            conn.execute(
                "INSERT INTO moods (id, owner, mood, stress_level, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.owner,
                    entry.mood,
                    entry.stress_level,
                    format_stamp(stamp),
                ],
            )?;
            Ok(entry)
        })
    }

    pub fn insert_journal(&self, owner: &str, content: &str) -> Result<JournalEntry> {
        self.with_stamp(|conn, stamp| {
            let entry = JournalEntry {
                id: Uuid::new_v4(),
                owner: owner.to_string(),
                content: content.to_string(),
                created_at: stamp,
            };
            conn.execute(
                "INSERT INTO journals (id, owner, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.owner,
                    entry.content,
                    format_stamp(stamp),
                ],
            )?;
            Ok(entry)
        })
    }

    /// Takes no caller argument at all; the table has nowhere to put one.
    pub fn insert_confession(&self, message: &str) -> Result<Confession> {
        self.with_stamp(|conn, stamp| {
            let entry = Confession {
                id: Uuid::new_v4(),
                message: message.to_string(),
                created_at: stamp,
            };
            conn.execute(
                "INSERT INTO confessions (id, message, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![entry.id.to_string(), entry.message, format_stamp(stamp)],
            )?;
            Ok(entry)
        })
    }

    pub fn insert_feedback(&self, owner: Option<&str>, message: &str) -> Result<Feedback> {
        self.with_stamp(|conn, stamp| {
            let entry = Feedback {
                id: Uuid::new_v4(),
                owner: owner.map(str::to_string),
                message: message.to_string(),
                created_at: stamp,
            };
            conn.execute(
                "INSERT INTO feedback (id, owner, message, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.owner,
                    entry.message,
                    format_stamp(stamp),
                ],
            )?;
            Ok(entry)
        })
    }

    // -- Listings (newest first, insertion order breaks ties) --

    pub fn list_moods(&self, filter: MoodFilter<'_>) -> Result<Vec<MoodEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, mood, stress_level, created_at FROM moods
                 WHERE (?1 IS NULL OR owner = ?1) AND (?2 IS NULL OR mood = ?2)
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![filter.owner, filter.mood], |row| {
                    Ok(MoodEntry {
                        id: uuid_col(row, 0)?,
                        owner: row.get(1)?,
                        mood: row.get(2)?,
                        stress_level: row.get(3)?,
                        created_at: stamp_col(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_journals(&self, owner: Option<&str>) -> Result<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, content, created_at FROM journals
                 WHERE (?1 IS NULL OR owner = ?1)
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([owner], |row| {
                    Ok(JournalEntry {
                        id: uuid_col(row, 0)?,
                        owner: row.get(1)?,
                        content: row.get(2)?,
                        created_at: stamp_col(row, 3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_confessions(&self) -> Result<Vec<Confession>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, message, created_at FROM confessions
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Confession {
                        id: uuid_col(row, 0)?,
                        message: row.get(1)?,
                        created_at: stamp_col(row, 2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_feedback(&self) -> Result<Vec<Feedback>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, message, created_at FROM feedback
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Feedback {
                        id: uuid_col(row, 0)?,
                        owner: row.get(1)?,
                        message: row.get(2)?,
                        created_at: stamp_col(row, 3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, identity: &str, role: Role, ttl: Duration) -> Result<SessionRow> {
        let now = truncate_stamp(Utc::now())?;
        let row = SessionRow {
            id: id.to_string(),
            identity: identity.to_string(),
            role,
            created_at: now,
            expires_at: truncate_stamp(now + ttl)?,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, identity, role, created_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    row.id,
                    row.identity,
                    row.role.as_str(),
                    format_stamp(row.created_at),
                    format_stamp(row.expires_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(row)
    }

    /// Returns the session only while it is unexpired.
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| query_live_session(conn, id, Utc::now()))
    }

    /// Returns whether a session was actually removed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.purge_sessions_expired_at(Utc::now())
    }

    fn purge_sessions_expired_at(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [format_stamp(now)],
            )?;
            Ok(n)
        })
    }
}

fn query_user_by_identity(conn: &Connection, identity: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, identity, display_name, password, role, created_at FROM users WHERE identity = ?1",
    )?;

    let row = stmt
        .query_row([identity], |row| {
            Ok(UserRow {
                id: uuid_col(row, 0)?,
                identity: row.get(1)?,
                display_name: row.get(2)?,
                password_hash: row.get(3)?,
                role: role_col(row, 4)?,
                created_at: stamp_col(row, 5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_live_session(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<Option<SessionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, identity, role, created_at, expires_at FROM sessions
         WHERE id = ?1 AND expires_at > ?2",
    )?;

    let row = stmt
        .query_row(rusqlite::params![id, format_stamp(now)], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                identity: row.get(1)?,
                role: role_col(row, 2)?,
                created_at: stamp_col(row, 3)?,
                expires_at: stamp_col(row, 4)?,
            })
        })
        .optional()?;

    Ok(row)
}

// -- Column decoding --

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_err(idx, e))
}

fn stamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn role_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_err(idx, e))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
