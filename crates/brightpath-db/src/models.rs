//! Database row types that carry data which must not reach API responses
//! (password hashes, session ids). Entry tables map straight to the
//! `brightpath-types` models.

use brightpath_types::models::{Role, User};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct UserRow {
    pub id: Uuid,
    pub identity: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            identity: self.identity.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub id: String,
    pub identity: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a signup insert. `Duplicate` comes from the UNIQUE index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created,
    Duplicate,
}

/// Equality filters for mood listings; `None` matches everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoodFilter<'a> {
    pub owner: Option<&'a str>,
    pub mood: Option<&'a str>,
}
