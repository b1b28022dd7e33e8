use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;
use warbler_types::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use crate::models::{NewUser, UserChanges, UserRow};
use crate::queries::{OptionalExt, USER_COLUMNS, now_timestamp, user_from_row};
use crate::{Database, Result};

impl Database {
    /// Inserts a user. Duplicate username or email fails with
    /// `StoreError::UniquenessViolation`.
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            email: new.email.to_string(),
            username: new.username.to_string(),
            password: new.password_hash.to_string(),
            image_url: new
                .image_url
                .filter(|url| !url.is_empty())
                .unwrap_or(DEFAULT_IMAGE_URL)
                .to_string(),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
            created_at: now_timestamp(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, password, image_url, header_image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.email,
                    row.username,
                    row.password,
                    row.image_url,
                    row.header_image_url,
                    row.created_at
                ],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, &id.to_string()))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"),
                [username],
                user_from_row,
            )
            .optional()
        })
    }

    /// All users ordered by username, optionally narrowed to usernames
    /// containing `needle` (case-insensitive).
    pub fn search_users(&self, needle: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE ?1 IS NULL OR instr(lower(u.username), lower(?1)) > 0
                 ORDER BY u.username"
            ))?;

            let rows = stmt
                .query_map([needle], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Applies `changes` and returns the updated row, or `None` if the user
    /// does not exist. An empty bio or location clears the stored value.
    pub fn update_user(&self, id: Uuid, changes: &UserChanges<'_>) -> Result<Option<UserRow>> {
        let id = id.to_string();
        self.with_tx(|conn| {
            conn.execute(
                "UPDATE users SET
                    email = COALESCE(?2, email),
                    username = COALESCE(?3, username),
                    image_url = COALESCE(?4, image_url),
                    header_image_url = COALESCE(?5, header_image_url),
                    bio = CASE WHEN ?6 IS NULL THEN bio ELSE NULLIF(?6, '') END,
                    location = CASE WHEN ?7 IS NULL THEN location ELSE NULLIF(?7, '') END
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    changes.email,
                    changes.username,
                    changes.image_url,
                    changes.header_image_url,
                    changes.bio,
                    changes.location
                ],
            )?;
            query_user_by_id(conn, &id)
        })
    }

    /// Deletes a user together with their follow edges, likes and messages,
    /// in one transaction. Returns `false` if there was no such user.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        let (edges, likes, messages, deleted) = self.with_tx(|conn| {
            let edges = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 OR followed_id = ?1",
                [&id],
            )?;
            // Likes given by the user and likes on the user's messages.
            let likes = conn.execute(
                "DELETE FROM likes
                 WHERE user_id = ?1
                    OR message_id IN (SELECT id FROM messages WHERE user_id = ?1)",
                [&id],
            )?;
            let messages = conn.execute("DELETE FROM messages WHERE user_id = ?1", [&id])?;
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [&id])?;
            Ok((edges, likes, messages, deleted))
        })?;

        if deleted > 0 {
            info!(
                "Deleted user {} ({} messages, {} follow edges, {} likes)",
                id, messages, edges, likes
            );
        }
        Ok(deleted > 0)
    }
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
        [id],
        user_from_row,
    )
    .optional()
}
