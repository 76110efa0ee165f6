use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::time::SqlTime;

/// Store a token digest for `(user_id, purpose)`, replacing any earlier one.
pub fn upsert_token(
    conn: &Connection,
    user_id: &str,
    purpose: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_tokens (user_id, purpose, token_hash, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, purpose)
         DO UPDATE SET token_hash = excluded.token_hash, expires_at = excluded.expires_at",
        params![user_id, purpose, token_hash, SqlTime(expires_at)],
    )?;
    Ok(())
}

/// Remove and return the stored digest and expiry. A token is single use.
pub fn take_token(conn: &Connection, user_id: &str, purpose: &str) -> Result<Option<(String, DateTime<Utc>)>> {
    let row = conn
        .query_row(
            "SELECT token_hash, expires_at FROM user_tokens WHERE user_id = ?1 AND purpose = ?2",
            params![user_id, purpose],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, SqlTime>(1)?.0)),
        )
        .optional()?;

    if row.is_some() {
        conn.execute(
            "DELETE FROM user_tokens WHERE user_id = ?1 AND purpose = ?2",
            params![user_id, purpose],
        )?;
    }
    Ok(row)
}
