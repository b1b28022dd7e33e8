use uuid::Uuid;
use warbler_types::Follow;

use crate::models::UserRow;
use crate::queries::{USER_COLUMNS, user_from_row};
use crate::{Database, Result};

impl Database {
    /// Adds the edge `follower_id -> followed_id`.
    ///
    /// Fails with `StoreError::ReferentialIntegrity` if either user is
    /// missing and `StoreError::UniquenessViolation` if the edge exists.
    pub fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<Follow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                [follower_id.to_string(), followed_id.to_string()],
            )?;
            Ok(Follow {
                follower_id,
                followed_id,
            })
        })
    }

    /// Returns `true` if an edge was removed.
    pub fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                [follower_id.to_string(), followed_id.to_string()],
            )?;
            Ok(n > 0)
        })
    }

    /// Does `user_id` follow `other_id`?
    pub fn is_following(&self, user_id: Uuid, other_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
                [user_id.to_string(), other_id.to_string()],
                |r| r.get(0),
            )?;
            Ok(found)
        })
    }

    /// Is `user_id` followed by `other_id`?
    pub fn is_followed_by(&self, user_id: Uuid, other_id: Uuid) -> Result<bool> {
        self.is_following(other_id, user_id)
    }

    /// Users following `user_id`, ordered by username.
    pub fn followers(&self, user_id: Uuid) -> Result<Vec<UserRow>> {
        self.follow_list(
            "JOIN follows f ON f.follower_id = u.id WHERE f.followed_id = ?1",
            user_id,
        )
    }

    /// Users `user_id` follows, ordered by username.
    pub fn following(&self, user_id: Uuid) -> Result<Vec<UserRow>> {
        self.follow_list(
            "JOIN follows f ON f.followed_id = u.id WHERE f.follower_id = ?1",
            user_id,
        )
    }

    /// `(following, followers)` counts for `user_id`.
    pub fn follow_counts(&self, user_id: Uuid) -> Result<(u64, u64)> {
        self.with_conn(|conn| {
            let (following, followers): (i64, i64) = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1)",
                [user_id.to_string()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            Ok((following as u64, followers as u64))
        })
    }

    fn follow_list(&self, join: &str, user_id: Uuid) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u {join} ORDER BY u.username"
            ))?;

            let rows = stmt
                .query_map([user_id.to_string()], user_from_row)?
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

    #[test]
    fn following_is_not_symmetric() {
        let db = Database::open_in_memory().unwrap();
        let user1 = add_user(&db, "testuser");
        let user2 = add_user(&db, "TESTUSERNAME");

        assert!(!db.is_following(user1, user2).unwrap());

        db.follow(user1, user2).unwrap();

        assert!(db.is_following(user1, user2).unwrap());
        assert!(!db.is_following(user2, user1).unwrap());
    }

    #[test]
    fn followed_by_is_the_converse() {
        let db = Database::open_in_memory().unwrap();
        let user1 = add_user(&db, "testuser");
        let user2 = add_user(&db, "TESTUSERNAME");

        assert!(!db.is_followed_by(user2, user1).unwrap());

        db.follow(user1, user2).unwrap();

        assert!(!db.is_followed_by(user1, user2).unwrap());
        assert!(db.is_followed_by(user2, user1).unwrap());
    }

    #[test]
    fn not_transitive() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "a");
        let b = add_user(&db, "b");
        let c = add_user(&db, "c");
        db.follow(a, b).unwrap();
        db.follow(b, c).unwrap();

        assert!(!db.is_following(a, c).unwrap());
    }

    #[test]
    fn lists_followers_and_following() {
        let db = Database::open_in_memory().unwrap();
        let star = add_user(&db, "star");
        let zed = add_user(&db, "zed");
        let amy = add_user(&db, "amy");
        db.follow(zed, star).unwrap();
        db.follow(amy, star).unwrap();
        db.follow(star, amy).unwrap();

        let followers: Vec<String> = db
            .followers(star)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(followers, vec!["amy", "zed"]);

        let following: Vec<String> = db
            .following(star)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(following, vec!["amy"]);

        assert_eq!(db.follow_counts(star).unwrap(), (1, 2));
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "a");
        let b = add_user(&db, "b");
        db.follow(a, b).unwrap();

        let err = db.follow(a, b).unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation(_)), "{err:?}");
    }

    #[test]
    fn edge_to_missing_user_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "a");

        let err = db.follow(a, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)), "{err:?}");
    }

    #[test]
    fn self_follow_is_allowed() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "a");
        db.follow(a, a).unwrap();
        assert!(db.is_following(a, a).unwrap());
    }

    #[test]
    fn unfollow_removes_only_that_edge() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "a");
        let b = add_user(&db, "b");
        db.follow(a, b).unwrap();
        db.follow(b, a).unwrap();

        assert!(db.unfollow(a, b).unwrap());
        assert!(!db.unfollow(a, b).unwrap());
        assert!(!db.is_following(a, b).unwrap());
        assert!(db.is_following(b, a).unwrap());
    }
}
