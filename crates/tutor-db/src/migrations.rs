use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE chats (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title         TEXT NOT NULL DEFAULT 'New Chat',
                last_message  TEXT NOT NULL DEFAULT '',
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE INDEX idx_chats_user
                ON chats(user_id, updated_at);

            CREATE TABLE messages (
                id           TEXT PRIMARY KEY,
                chat_id      TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                role         TEXT NOT NULL CHECK (role IN ('user', 'bot')),
                content      TEXT NOT NULL,
                explanation  TEXT,
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_messages_chat
                ON messages(chat_id, created_at);

            CREATE TABLE quizzes (
                id               TEXT PRIMARY KEY,
                user_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                score            INTEGER NOT NULL DEFAULT 0,
                total_questions  INTEGER NOT NULL DEFAULT 0,
                completed        INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL,
                CHECK (score <= total_questions)
            );

            CREATE INDEX idx_quizzes_user
                ON quizzes(user_id, completed, created_at);

            CREATE TABLE quiz_questions (
                quiz_id           TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
                position          INTEGER NOT NULL,
                question          TEXT NOT NULL,
                answer            TEXT NOT NULL,
                explanation       TEXT NOT NULL,
                from_chat_id      TEXT,
                is_user_question  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (quiz_id, position)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
