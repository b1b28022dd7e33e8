use uuid::Uuid;

use crate::models::MessageRow;
use crate::queries::{MESSAGE_COLUMNS, message_from_row, now_timestamp};
use crate::{Database, Result};

impl Database {
    /// Toggle a like: removes it if present, adds it if not.
    /// Returns `true` when the message is liked afterwards.
    ///
    /// Liking a missing message or as a missing user fails with
    /// `StoreError::ReferentialIntegrity`.
    pub fn toggle_like(&self, user_id: Uuid, message_id: Uuid) -> Result<bool> {
        let user_id = user_id.to_string();
        let message_id = message_id.to_string();
        self.with_tx(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [&user_id, &message_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO likes (user_id, message_id, created_at) VALUES (?1, ?2, ?3)",
                [&user_id, &message_id, &now_timestamp()],
            )?;
            Ok(true)
        })
    }

    /// How many messages `user_id` has liked.
    pub fn likes_count(&self, user_id: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE user_id = ?1",
                [user_id.to_string()],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }

    /// How many users have liked `message_id`.
    pub fn message_like_count(&self, message_id: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE message_id = ?1",
                [message_id.to_string()],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }

    /// Messages `user_id` has liked, most recently liked first.
    pub fn liked_messages(&self, user_id: Uuid, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use crate::models::NewUser;

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

    fn add_message(db: &Database, owner: Uuid, text: &str) -> Uuid {
        db.insert_message(owner, text).unwrap().id.parse().unwrap()
    }

    #[test]
    fn toggle_like_adds_then_removes() {
        let db = Database::open_in_memory().unwrap();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let msg = add_message(&db, author, "likeable");

        assert!(db.toggle_like(fan, msg).unwrap());
        assert_eq!(db.likes_count(fan).unwrap(), 1);
        assert_eq!(db.message_like_count(msg).unwrap(), 1);

        assert!(!db.toggle_like(fan, msg).unwrap());
        assert_eq!(db.likes_count(fan).unwrap(), 0);
        assert_eq!(db.message_like_count(msg).unwrap(), 0);
    }

    #[test]
    fn liking_missing_message_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let fan = add_user(&db, "fan");

        let err = db.toggle_like(fan, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)), "{err:?}");
        assert_eq!(db.likes_count(fan).unwrap(), 0);
    }

    #[test]
    fn liked_messages_newest_like_first() {
        let db = Database::open_in_memory().unwrap();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let first = add_message(&db, author, "first");
        let second = add_message(&db, author, "second");
        add_message(&db, author, "ignored");

        db.toggle_like(fan, second).unwrap();
        db.toggle_like(fan, first).unwrap();

        let texts: Vec<String> = db
            .liked_messages(fan, 10)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn deleting_message_drops_its_likes() {
        let db = Database::open_in_memory().unwrap();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let msg = add_message(&db, author, "short-lived");
        db.toggle_like(fan, msg).unwrap();

        assert!(db.delete_message(msg).unwrap());
        assert_eq!(db.likes_count(fan).unwrap(), 0);
    }

    #[test]
    fn deleting_user_drops_given_and_received_likes() {
        let db = Database::open_in_memory().unwrap();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let theirs = add_message(&db, author, "author's");
        let mine = add_message(&db, fan, "fan's");
        db.toggle_like(fan, theirs).unwrap();
        db.toggle_like(author, mine).unwrap();

        assert!(db.delete_user(fan).unwrap());

        assert_eq!(db.likes_count(author).unwrap(), 0);
        assert_eq!(db.message_like_count(theirs).unwrap(), 0);
    }
}
