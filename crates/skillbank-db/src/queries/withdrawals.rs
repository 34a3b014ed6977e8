use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use skillbank_types::models::{SortOrder, WithdrawalStatus};

use super::{clamp_limit, tag};
use crate::Database;
use crate::models::WithdrawalRow;

const WITHDRAWAL_COLUMNS: &str = "id, user_id, amount, destination, user_notes, status, \
                                  admin_id, admin_notes, resolved_at, created_at, updated_at";

impl Database {
    pub fn list_withdrawals(
        &self,
        user_id: Option<&str>,
        status: Option<WithdrawalStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<WithdrawalRow>> {
        self.with_conn(|conn| Ok(query_withdrawals(conn, user_id, status, order, limit)?))
    }
}

pub fn insert_withdrawal(
    conn: &Connection,
    id: &str,
    user_id: &str,
    amount: i64,
    destination: &str,
    user_notes: Option<&str>,
) -> rusqlite::Result<WithdrawalRow> {
    conn.query_row(
        &format!(
            "INSERT INTO withdrawal_requests (id, user_id, amount, destination, user_notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {WITHDRAWAL_COLUMNS}"
        ),
        rusqlite::params![id, user_id, amount, destination, user_notes],
        map_withdrawal,
    )
}

pub fn withdrawal_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<WithdrawalRow>> {
    conn.query_row(
        &format!("SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = ?1"),
        [id],
        map_withdrawal,
    )
    .optional()
}

/// Moves a pending request to a terminal status. Returns `None` if the request
/// is missing or already resolved.
pub fn resolve_withdrawal(
    conn: &Connection,
    id: &str,
    status: WithdrawalStatus,
    admin_id: &str,
    admin_notes: Option<&str>,
) -> rusqlite::Result<Option<WithdrawalRow>> {
    conn.query_row(
        &format!(
            "UPDATE withdrawal_requests
             SET status = ?2,
                 admin_id = ?3,
                 admin_notes = ?4,
                 resolved_at = strftime('%Y-%m-%d %H:%M:%f', 'now'),
                 updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
             WHERE id = ?1 AND status = 'pending'
             RETURNING {WITHDRAWAL_COLUMNS}"
        ),
        rusqlite::params![id, status.as_str(), admin_id, admin_notes],
        map_withdrawal,
    )
    .optional()
}

pub fn query_withdrawals(
    conn: &Connection,
    user_id: Option<&str>,
    status: Option<WithdrawalStatus>,
    order: SortOrder,
    limit: u32,
) -> rusqlite::Result<Vec<WithdrawalRow>> {
    let dir = order.sql();
    let mut stmt = conn.prepare(&format!(
        "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests
         WHERE (?1 IS NULL OR user_id = ?1)
           AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at {dir}, rowid {dir}
         LIMIT ?3"
    ))?;

    let rows = stmt
        .query_map(
            rusqlite::params![user_id, status.map(|s| s.as_str()), clamp_limit(limit)],
            map_withdrawal,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Sum of amounts still escrowed for the user.
pub fn pending_withdrawal_sum(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM withdrawal_requests
         WHERE user_id = ?1 AND status = 'pending'",
        [user_id],
        |row| row.get(0),
    )
}

fn map_withdrawal(row: &Row<'_>) -> rusqlite::Result<WithdrawalRow> {
    Ok(WithdrawalRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        destination: row.get(3)?,
        user_notes: row.get(4)?,
        status: tag(row, 5)?,
        admin_id: row.get(6)?,
        admin_notes: row.get(7)?,
        resolved_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
