use rusqlite::Connection;
use tracing::info;
use warbler_types::MAX_MESSAGE_LEN;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, messages, follows)");
        // No ON DELETE CASCADE: removing a user is an explicit cleanup in
        // `Database::delete_user`.
        conn.execute_batch(&format!(
            "
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                email               TEXT NOT NULL UNIQUE,
                username            TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                image_url           TEXT NOT NULL,
                header_image_url    TEXT NOT NULL,
                bio                 TEXT,
                location            TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                text        TEXT NOT NULL CHECK (length(text) BETWEEN 1 AND {MAX_MESSAGE_LEN}),
                user_id     TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_messages_user
                ON messages(user_id, created_at);

            CREATE TABLE follows (
                follower_id TEXT NOT NULL REFERENCES users(id),
                followed_id TEXT NOT NULL REFERENCES users(id),
                PRIMARY KEY (follower_id, followed_id)
            );

            CREATE INDEX idx_follows_followed
                ON follows(followed_id);

            INSERT INTO schema_version (version) VALUES (1);
            "
        ))?;
    }

    if version < 2 {
        info!("Running migration v2 (likes)");
        conn.execute_batch(
            "
            CREATE TABLE likes (
                user_id     TEXT NOT NULL REFERENCES users(id),
                message_id  TEXT NOT NULL REFERENCES messages(id),
                created_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, message_id)
            );

            CREATE INDEX idx_likes_message
                ON likes(message_id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
