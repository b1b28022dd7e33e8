use uuid::Uuid;
use warbler_types::MAX_MESSAGE_LEN;

use crate::models::MessageRow;
use crate::queries::{MESSAGE_COLUMNS, OptionalExt, message_from_row, now_timestamp};
use crate::{Database, Result, StoreError};

/// Upper bound on a home timeline page.
pub const TIMELINE_LIMIT: u32 = 100;

impl Database {
    /// Stores a message owned by `user_id`.
    ///
    /// Empty or over-long text fails with `StoreError::Validation`; an unknown
    /// owner fails with `StoreError::ReferentialIntegrity`.
    pub fn insert_message(&self, user_id: Uuid, text: &str) -> Result<MessageRow> {
        validate_text(text)?;

        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, text, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![row.id, row.text, row.user_id, row.created_at],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    pub fn get_message(&self, id: Uuid) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1"),
                [id.to_string()],
                message_from_row,
            )
            .optional()
        })
    }

    /// Deletes a message and its likes. Returns `false` if no such message
    /// existed.
    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        self.with_tx(|conn| {
            conn.execute("DELETE FROM likes WHERE message_id = ?1", [&id])?;
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [&id])?;
            Ok(n > 0)
        })
    }

    /// A user's own messages, newest first.
    pub fn messages_by_user(&self, user_id: Uuid, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.user_id = ?1
                 ORDER BY m.created_at DESC, m.rowid DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Messages written by `user_id` or anyone they follow, newest first.
    /// `limit` is capped at `TIMELINE_LIMIT`.
    pub fn timeline(&self, user_id: Uuid, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.created_at DESC, m.rowid DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![user_id.to_string(), limit.min(TIMELINE_LIMIT)],
                    message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn message_count(&self, user_id: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                [user_id.to_string()],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }

    pub fn total_messages(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(StoreError::Validation("message text is empty".into()));
    }
    let len = text.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(StoreError::Validation(format!(
            "message text is {} characters, limit is {}",
            len, MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn setup() -> (Database, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let row = db
            .create_user(&NewUser {
                email: "OURTEST@test.com",
                username: "TESTUSERNAME",
                password_hash: "HASHED_PASSWORD",
                image_url: None,
            })
            .unwrap();
        let id = row.id.parse().unwrap();
        (db, id)
    }

    fn add_user(db: &Database, name: &str) -> Uuid {
        db.create_user(&NewUser {
            email: &format!("{name}@test.com"),
            username: name,
            password_hash: "HASHED_PASSWORD",
            image_url: None,
        })
        .unwrap()
        .id
        .parse()
        .unwrap()
    }

    #[test]
    fn post_and_fetch_message() {
        let (db, user) = setup();
        let row = db.insert_message(user, "This is a test.").unwrap();

        let msg = db
            .get_message(row.id.parse().unwrap())
            .unwrap()
            .unwrap()
            .into_message();
        assert_eq!(msg.text, "This is a test.");
        assert_eq!(msg.user_id, user);
        assert_eq!(db.message_count(user).unwrap(), 1);
    }

    #[test]
    fn text_at_limit_is_accepted() {
        let (db, user) = setup();
        let text = "s".repeat(MAX_MESSAGE_LEN);
        assert!(db.insert_message(user, &text).is_ok());

        // Length counts characters, not bytes.
        let wide = "é".repeat(MAX_MESSAGE_LEN);
        assert!(db.insert_message(user, &wide).is_ok());
    }

    #[test]
    fn text_over_limit_is_rejected() {
        let (db, user) = setup();
        let err = db.insert_message(user, &"s".repeat(150)).err().unwrap();
        assert!(matches!(err, StoreError::Validation(_)), "{err:?}");
        assert_eq!(db.total_messages().unwrap(), 0);
    }

    #[test]
    fn empty_text_is_rejected() {
        let (db, user) = setup();
        let err = db.insert_message(user, "").err().unwrap();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let (db, _) = setup();
        let err = db.insert_message(Uuid::new_v4(), "orphan").err().unwrap();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)), "{err:?}");
        assert_eq!(db.total_messages().unwrap(), 0);
    }

    #[test]
    fn delete_removes_message() {
        let (db, user) = setup();
        let id: Uuid = db.insert_message(user, "Hello").unwrap().id.parse().unwrap();

        assert!(db.delete_message(id).unwrap());
        assert!(db.get_message(id).unwrap().is_none());
        assert!(!db.delete_message(id).unwrap());
    }

    #[test]
    fn messages_by_user_newest_first() {
        let (db, user) = setup();
        db.insert_message(user, "first").unwrap();
        db.insert_message(user, "second").unwrap();
        db.insert_message(user, "third").unwrap();

        let texts: Vec<String> = db
            .messages_by_user(user, 2)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["third", "second"]);
    }

    #[test]
    fn timeline_includes_followed_users_only() {
        let (db, me) = setup();
        let friend = add_user(&db, "friend");
        let stranger = add_user(&db, "stranger");
        db.follow(me, friend).unwrap();

        db.insert_message(me, "mine").unwrap();
        db.insert_message(friend, "friend's").unwrap();
        db.insert_message(stranger, "stranger's").unwrap();

        let texts: Vec<String> = db
            .timeline(me, 50)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["friend's", "mine"]);
    }
}
