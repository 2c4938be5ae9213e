use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
        r.get(0)
    })?;

    if version < 1 {
        info!("Running migration v1 (users, habits, logs, followers)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                avatar_url      TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE habits (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                color_hue   INTEGER NOT NULL DEFAULT 0,
                is_boolean  INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_habits_user
                ON habits(user_id, created_at);

            CREATE TABLE habit_logs (
                id          TEXT PRIMARY KEY,
                habit_id    TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                log_date    TEXT NOT NULL,
                value       INTEGER NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(habit_id, log_date)
            );

            CREATE TABLE followers (
                follower_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                following_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                PRIMARY KEY (follower_id, following_id),
                CHECK (follower_id <> following_id)
            );

            CREATE INDEX idx_followers_following
                ON followers(following_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (log activity index)");
        conn.execute_batch(
            "
            CREATE INDEX idx_habit_logs_updated
                ON habit_logs(updated_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
