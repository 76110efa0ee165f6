use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::models::RoleRow;
use crate::queries::users::normalize;

impl Database {
    pub fn get_roles_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| query_roles_for_user(conn, user_id))
    }

    /// Batch-fetch role names for a set of users.
    pub fn get_roles_for_users(&self, user_ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=user_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT ur.user_id, r.name
                 FROM user_roles ur
                 JOIN roles r ON r.id = ur.role_id
                 WHERE ur.user_id IN ({})
                 ORDER BY r.name",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = user_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let mut roles: HashMap<String, Vec<String>> = HashMap::new();
            let rows = stmt.query_map(params.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (user_id, role) = row?;
                roles.entry(user_id).or_default().push(role);
            }

            Ok(roles)
        })
    }

    pub fn is_user_in_role(&self, user_id: &str, role: &str) -> Result<bool> {
        self.with_conn(|conn| query_is_in_role(conn, user_id, role))
    }

    pub fn count_users_in_role(&self, role: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_roles ur
                 JOIN roles r ON r.id = ur.role_id
                 WHERE r.normalized_name = ?1",
                [normalize(role)],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

pub fn query_role_by_name(conn: &Connection, name: &str) -> Result<Option<RoleRow>> {
    let row = conn
        .query_row(
            "SELECT id, name FROM roles WHERE normalized_name = ?1",
            [normalize(name)],
            |row| {
                Ok(RoleRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Fetch the role, creating it on first use.
pub fn ensure_role(conn: &Connection, name: &str) -> Result<RoleRow> {
    if let Some(role) = query_role_by_name(conn, name)? {
        return Ok(role);
    }

    let role = RoleRow {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
    };
    conn.execute(
        "INSERT INTO roles (id, name, normalized_name) VALUES (?1, ?2, ?3)",
        params![role.id, role.name, normalize(name)],
    )?;
    info!("Created role '{}'", name);
    Ok(role)
}

pub fn query_roles_for_user(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT r.name FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ?1
         ORDER BY r.name",
    )?;
    let roles = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(roles)
}

pub fn query_is_in_role(conn: &Connection, user_id: &str, role: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ?1 AND r.normalized_name = ?2",
            params![user_id, normalize(role)],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Returns `false` if the membership already existed.
pub fn add_user_to_role(conn: &Connection, user_id: &str, role_id: &str) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
        params![user_id, role_id],
    )?;
    Ok(n > 0)
}

/// Returns `false` if there was no membership to remove.
pub fn remove_user_from_role(conn: &Connection, user_id: &str, role_id: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1 AND role_id = ?2",
        params![user_id, role_id],
    )?;
    Ok(n > 0)
}
