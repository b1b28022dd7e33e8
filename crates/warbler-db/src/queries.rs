use chrono::{SecondsFormat, Utc};
use rusqlite::Row;

use crate::models::{MessageRow, UserRow};
use crate::{Result, StoreError};

/// Column list matching `user_from_row`; tables must be aliased `u`.
pub(crate) const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.password, u.image_url, u.header_image_url, u.bio, u.location, u.created_at";

/// Column list matching `message_from_row`; tables must be aliased `m`.
pub(crate) const MESSAGE_COLUMNS: &str = "m.id, m.text, m.user_id, m.created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        header_image_url: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// RFC 3339 with milliseconds, so rows sort lexically in creation order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }
}
