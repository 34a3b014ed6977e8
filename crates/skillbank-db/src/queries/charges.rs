use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use skillbank_types::models::{ChargeStatus, SortOrder};

use super::{clamp_limit, new_id, tag};
use crate::Database;
use crate::models::ChargeRow;

const CHARGE_COLUMNS: &str = "id, user_id, amount, payer_phone, external_txn_id, proof_path, \
                              proof_sha256, status, verified_by, verification_notes, \
                              verified_at, created_at, updated_at";

/// Fields supplied by the depositing user.
#[derive(Debug, Clone)]
pub struct NewCharge<'a> {
    pub user_id: &'a str,
    pub amount: i64,
    pub payer_phone: &'a str,
    pub external_txn_id: &'a str,
    pub proof_path: &'a str,
    pub proof_sha256: &'a str,
}

impl Database {
    pub fn list_charges(
        &self,
        user_id: Option<&str>,
        status: Option<ChargeStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<ChargeRow>> {
        self.with_conn(|conn| Ok(query_charges(conn, user_id, status, order, limit)?))
    }
}

pub fn insert_charge(conn: &Connection, new: &NewCharge<'_>) -> rusqlite::Result<ChargeRow> {
    conn.query_row(
        &format!(
            "INSERT INTO charge_transactions
                (id, user_id, amount, payer_phone, external_txn_id, proof_path, proof_sha256)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {CHARGE_COLUMNS}"
        ),
        rusqlite::params![
            new_id(),
            new.user_id,
            new.amount,
            new.payer_phone,
            new.external_txn_id,
            new.proof_path,
            new.proof_sha256,
        ],
        map_charge,
    )
}

pub fn charge_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<ChargeRow>> {
    conn.query_row(
        &format!("SELECT {CHARGE_COLUMNS} FROM charge_transactions WHERE id = ?1"),
        [id],
        map_charge,
    )
    .optional()
}

/// A claim that is still pending or already verified for the same external
/// payment or the same proof file.
pub fn live_charge_conflict(
    conn: &Connection,
    external_txn_id: &str,
    proof_sha256: &str,
) -> rusqlite::Result<Option<ChargeRow>> {
    conn.query_row(
        &format!(
            "SELECT {CHARGE_COLUMNS} FROM charge_transactions
             WHERE status != 'rejected'
               AND (external_txn_id = ?1 OR proof_sha256 = ?2)
             LIMIT 1"
        ),
        [external_txn_id, proof_sha256],
        map_charge,
    )
    .optional()
}

/// Moves a pending charge to a terminal status. Returns `None` if the charge
/// is missing or no longer pending; the row is untouched in that case.
pub fn resolve_charge(
    conn: &Connection,
    id: &str,
    status: ChargeStatus,
    verified_by: &str,
    notes: Option<&str>,
) -> rusqlite::Result<Option<ChargeRow>> {
    conn.query_row(
        &format!(
            "UPDATE charge_transactions
             SET status = ?2,
                 verified_by = ?3,
                 verification_notes = ?4,
                 verified_at = strftime('%Y-%m-%d %H:%M:%f', 'now'),
                 updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
             WHERE id = ?1 AND status = 'pending'
             RETURNING {CHARGE_COLUMNS}"
        ),
        rusqlite::params![id, status.as_str(), verified_by, notes],
        map_charge,
    )
    .optional()
}

pub fn query_charges(
    conn: &Connection,
    user_id: Option<&str>,
    status: Option<ChargeStatus>,
    order: SortOrder,
    limit: u32,
) -> rusqlite::Result<Vec<ChargeRow>> {
    let dir = order.sql();
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARGE_COLUMNS} FROM charge_transactions
         WHERE (?1 IS NULL OR user_id = ?1)
           AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at {dir}, rowid {dir}
         LIMIT ?3"
    ))?;

    let rows = stmt
        .query_map(
            rusqlite::params![user_id, status.map(|s| s.as_str()), clamp_limit(limit)],
            map_charge,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn map_charge(row: &Row<'_>) -> rusqlite::Result<ChargeRow> {
    Ok(ChargeRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        payer_phone: row.get(3)?,
        external_txn_id: row.get(4)?,
        proof_path: row.get(5)?,
        proof_sha256: row.get(6)?,
        status: tag(row, 7)?,
        verified_by: row.get(8)?,
        verification_notes: row.get(9)?,
        verified_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
