use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use skillbank_types::models::{EntryKind, SortOrder};

use super::{clamp_limit, new_id, tag};
use crate::Database;
use crate::models::{BalanceRow, LedgerEntryRow};

const BALANCE_COLUMNS: &str = "user_id, balance, reserved_balance, version, updated_at";
const ENTRY_COLUMNS: &str = "id, user_id, kind, source, balance_delta, reserved_delta, \
                             balance_after, reserved_after, reference_id, created_at";

impl Database {
    // -- Balances --

    pub fn get_balance(&self, user_id: &str) -> Result<Option<BalanceRow>> {
        self.with_conn(|conn| Ok(balance_for_user(conn, user_id)?))
    }

    // -- Ledger entries --

    pub fn get_ledger_entries(
        &self,
        user_id: &str,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<LedgerEntryRow>> {
        self.with_conn(|conn| Ok(entries_for_user(conn, user_id, order, limit)?))
    }
}

/// Balances are created lazily; this makes sure the row exists before an update.
pub fn ensure_balance(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO balances (user_id) VALUES (?1)",
        [user_id],
    )?;
    Ok(())
}

pub fn balance_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<BalanceRow>> {
    conn.query_row(
        &format!("SELECT {BALANCE_COLUMNS} FROM balances WHERE user_id = ?1"),
        [user_id],
        map_balance,
    )
    .optional()
}

/// Applies both deltas in one statement. Returns `None` without touching the
/// row when either field would go negative.
pub fn apply_guarded_delta(
    conn: &Connection,
    user_id: &str,
    balance_delta: i64,
    reserved_delta: i64,
) -> rusqlite::Result<Option<BalanceRow>> {
    conn.query_row(
        &format!(
            "UPDATE balances
             SET balance = balance + ?2,
                 reserved_balance = reserved_balance + ?3,
                 version = version + 1,
                 updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
             WHERE user_id = ?1
               AND balance + ?2 >= 0
               AND reserved_balance + ?3 >= 0
             RETURNING {BALANCE_COLUMNS}"
        ),
        (user_id, balance_delta, reserved_delta),
        map_balance,
    )
    .optional()
}

/// Appends one ledger entry describing a mutation that produced `after`.
pub fn insert_ledger_entry(
    conn: &Connection,
    kind: EntryKind,
    source: &str,
    balance_delta: i64,
    reserved_delta: i64,
    after: &BalanceRow,
    reference_id: Option<&str>,
) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO ledger_entries
            (id, user_id, kind, source, balance_delta, reserved_delta,
             balance_after, reserved_after, reference_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            id,
            after.user_id,
            kind.as_str(),
            source,
            balance_delta,
            reserved_delta,
            after.balance,
            after.reserved_balance,
            reference_id,
        ],
    )?;
    Ok(id)
}

pub fn entries_for_user(
    conn: &Connection,
    user_id: &str,
    order: SortOrder,
    limit: u32,
) -> rusqlite::Result<Vec<LedgerEntryRow>> {
    let dir = order.sql();
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE user_id = ?1
         ORDER BY created_at {dir}, rowid {dir}
         LIMIT ?2"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, clamp_limit(limit)], map_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Sums of every delta ever recorded for the user: (balance, reserved).
pub fn ledger_sums(conn: &Connection, user_id: &str) -> rusqlite::Result<(i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(SUM(balance_delta), 0), COALESCE(SUM(reserved_delta), 0)
         FROM ledger_entries WHERE user_id = ?1",
        [user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

fn map_balance(row: &Row<'_>) -> rusqlite::Result<BalanceRow> {
    Ok(BalanceRow {
        user_id: row.get(0)?,
        balance: row.get(1)?,
        reserved_balance: row.get(2)?,
        version: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntryRow> {
    Ok(LedgerEntryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: tag(row, 2)?,
        source: row.get(3)?,
        balance_delta: row.get(4)?,
        reserved_delta: row.get(5)?,
        balance_after: row.get(6)?,
        reserved_after: row.get(7)?,
        reference_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}
