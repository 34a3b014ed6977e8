use anyhow::Result;
use rusqlite::{Connection, Row};
use skillbank_types::models::SortOrder;

use super::{clamp_limit, tag};
use crate::Database;
use crate::models::PaymentRow;

const PAYMENT_COLUMNS: &str = "id, sender_id, recipient_id, amount, note, status, created_at";

impl Database {
    /// Payments the user sent or received.
    pub fn list_payments(
        &self,
        user_id: &str,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<PaymentRow>> {
        self.with_conn(|conn| Ok(payments_for_user(conn, user_id, order, limit)?))
    }
}

pub fn insert_payment(
    conn: &Connection,
    id: &str,
    sender_id: &str,
    recipient_id: &str,
    amount: i64,
    note: Option<&str>,
) -> rusqlite::Result<PaymentRow> {
    conn.query_row(
        &format!(
            "INSERT INTO payments (id, sender_id, recipient_id, amount, note, status)
             VALUES (?1, ?2, ?3, ?4, ?5, 'completed')
             RETURNING {PAYMENT_COLUMNS}"
        ),
        rusqlite::params![id, sender_id, recipient_id, amount, note],
        map_payment,
    )
}

pub fn payments_for_user(
    conn: &Connection,
    user_id: &str,
    order: SortOrder,
    limit: u32,
) -> rusqlite::Result<Vec<PaymentRow>> {
    let dir = order.sql();
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments
         WHERE sender_id = ?1 OR recipient_id = ?1
         ORDER BY created_at {dir}, rowid {dir}
         LIMIT ?2"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, clamp_limit(limit)], map_payment)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn map_payment(row: &Row<'_>) -> rusqlite::Result<PaymentRow> {
    Ok(PaymentRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        amount: row.get(3)?,
        note: row.get(4)?,
        status: tag(row, 5)?,
        created_at: row.get(6)?,
    })
}
