//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the warbler-types models so the API never sees password
//! hashes.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;
use warbler_types::{Message, User};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub created_at: String,
}

/// Fields for a fresh `users` row. The password must already be hashed.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub image_url: Option<&'a str>,
}

/// Profile edits; `None` keeps the stored value. `Some("")` clears `bio`
/// and `location`.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub username: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: parse_id(&self.id, "user"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            email: self.email,
            username: self.username,
            image_url: self.image_url,
            header_image_url: self.header_image_url,
            bio: self.bio,
            location: self.location,
        }
    }
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        Message {
            id: parse_id(&self.id, "message"),
            user_id: parse_id(&self.user_id, "message owner"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            text: self.text,
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now'),
            // which has no timezone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
