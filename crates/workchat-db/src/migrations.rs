use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

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
                id                      TEXT PRIMARY KEY,
                user_name               TEXT NOT NULL,
                normalized_user_name    TEXT NOT NULL UNIQUE,
                email                   TEXT NOT NULL,
                normalized_email        TEXT NOT NULL UNIQUE,
                email_confirmed         INTEGER NOT NULL DEFAULT 0,
                password_hash           TEXT NOT NULL,
                security_stamp          TEXT NOT NULL,
                name                    TEXT NOT NULL,
                last_name               TEXT NOT NULL,
                created_at              TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at              TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE roles (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                normalized_name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE user_roles (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role_id     TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, role_id)
            );

            CREATE TABLE user_tokens (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                purpose     TEXT NOT NULL,
                token_hash  TEXT NOT NULL,
                expires_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, purpose)
            );

            CREATE TABLE chat_rooms (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT CHECK (name IS NULL OR length(name) <= 100),
                is_group            INTEGER NOT NULL DEFAULT 0,
                created_by_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE chat_room_participants (
                chat_room_id    INTEGER NOT NULL REFERENCES chat_rooms(id) ON DELETE CASCADE,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                is_admin        INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (chat_room_id, user_id)
            );

            CREATE INDEX idx_participants_user
                ON chat_room_participants(user_id);

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_room_id    INTEGER NOT NULL REFERENCES chat_rooms(id) ON DELETE CASCADE,
                sender_id       TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                text            TEXT NOT NULL CHECK (length(text) > 0),
                is_edited       INTEGER NOT NULL DEFAULT 0,
                is_deleted      INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_messages_room
                ON messages(chat_room_id, created_at);

            CREATE TABLE announcements (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                title               TEXT NOT NULL CHECK (length(title) <= 120),
                body                TEXT NOT NULL CHECK (length(body) <= 2000),
                is_pinned           INTEGER NOT NULL DEFAULT 0,
                is_published        INTEGER NOT NULL DEFAULT 1,
                created_by_user_id  TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_announcements_order
                ON announcements(is_pinned, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
