use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use skillbank_types::models::Role;

use super::tag;
use crate::Database;
use crate::models::UserRow;

const USER_COLUMNS: &str = "id, username, password, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            insert_user(conn, id, username, password_hash)?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| Ok(user_by_username(conn, username)?))
    }

    // -- Roles --

    pub fn get_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        self.with_conn(|conn| Ok(roles_for_user(conn, user_id)?))
    }
}

pub fn insert_user(
    conn: &Connection,
    id: &str,
    username: &str,
    password_hash: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
        (id, username, password_hash),
    )?;
    Ok(())
}

pub fn user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        [username],
        map_user,
    )
    .optional()
}

pub fn user_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        map_user,
    )
    .optional()
}

/// Stored roles only; the implicit `user` role is never persisted.
pub fn roles_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Role>> {
    let mut stmt =
        conn.prepare("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role")?;
    let roles = stmt
        .query_map([user_id], |row| tag::<Role>(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(roles)
}

/// Returns `true` when the role was newly granted.
pub fn grant_role(
    conn: &Connection,
    user_id: &str,
    role: Role,
    granted_by: Option<&str>,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role, granted_by) VALUES (?1, ?2, ?3)",
        (user_id, role.as_str(), granted_by),
    )?;
    Ok(inserted > 0)
}

/// Returns `true` when a stored role was removed.
pub fn revoke_role(conn: &Connection, user_id: &str, role: Role) -> rusqlite::Result<bool> {
    let removed = conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2",
        (user_id, role.as_str()),
    )?;
    Ok(removed > 0)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}
