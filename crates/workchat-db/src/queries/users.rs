use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::UserRow;
use crate::stamp::{Record, Timestamps};
use crate::time::SqlTime;

const USER_COLUMNS: &str = "id, user_name, email, email_confirmed, password_hash, security_stamp, \
                            name, last_name, created_at, updated_at";

/// Lookup key used for the case-insensitive unique columns.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        user_name: row.get(1)?,
        email: row.get(2)?,
        email_confirmed: row.get(3)?,
        password_hash: row.get(4)?,
        security_stamp: row.get(5)?,
        name: row.get(6)?,
        last_name: row.get(7)?,
        timestamps: Timestamps {
            created_at: row.get::<_, SqlTime>(8)?.0,
            updated_at: row.get::<_, SqlTime>(9)?.0,
        },
    })
}

impl Record for UserRow {
    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO users (id, user_name, normalized_user_name, email, normalized_email,
                                email_confirmed, password_hash, security_stamp, name, last_name,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.id,
                self.user_name,
                normalize(&self.user_name),
                self.email,
                normalize(&self.email),
                self.email_confirmed,
                self.password_hash,
                self.security_stamp,
                self.name,
                self.last_name,
                SqlTime(self.timestamps.created_at),
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE users SET user_name = ?2, normalized_user_name = ?3, email = ?4,
                              normalized_email = ?5, email_confirmed = ?6, password_hash = ?7,
                              security_stamp = ?8, name = ?9, last_name = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                self.id,
                self.user_name,
                normalize(&self.user_name),
                self.email,
                normalize(&self.email),
                self.email_confirmed,
                self.password_hash,
                self.security_stamp,
                self.name,
                self.last_name,
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        Ok(())
    }
}

impl Database {
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_user_name(conn, user_name))
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    /// One page of users ordered by email, plus the total number of matches.
    /// `filter` is a case-insensitive substring match against email, user
    /// name, name or last name; a row matching any one of them is included.
    pub fn search_users(&self, filter: Option<&str>, offset: u64, limit: u32) -> Result<(Vec<UserRow>, u64)> {
        let pattern = filter.map(like_pattern);
        self.with_conn(|conn| {
            let where_clause = r"WHERE ?1 IS NULL
                   OR email LIKE ?1 ESCAPE '\'
                   OR user_name LIKE ?1 ESCAPE '\'
                   OR name LIKE ?1 ESCAPE '\'
                   OR last_name LIKE ?1 ESCAPE '\'";

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM users {where_clause}"),
                params![pattern],
                |r| r.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users {where_clause}
                 ORDER BY email COLLATE NOCASE, id
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![pattern, limit, offset], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }
}

pub fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"), [id], map_user)
        .optional()?;
    Ok(row)
}

pub fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE normalized_email = ?1"),
            [normalize(email)],
            map_user,
        )
        .optional()?;
    Ok(row)
}

pub fn query_user_by_user_name(conn: &Connection, user_name: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE normalized_user_name = ?1"),
            [normalize(user_name)],
            map_user,
        )
        .optional()?;
    Ok(row)
}

/// Returns `false` when no such user existed.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(n > 0)
}

fn like_pattern(filter: &str) -> String {
    let mut pattern = String::with_capacity(filter.len() + 2);
    pattern.push('%');
    for c in filter.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
