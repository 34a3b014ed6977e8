//! The single balance mutation path.
//!
//! Every change to `balances` goes through [`apply_delta`], which applies a
//! guarded update and appends the matching ledger entry on the caller's
//! transaction. Nothing else in the crate writes balances.

use rusqlite::Connection;
use skillbank_db::models::BalanceRow;
use skillbank_db::queries::balances;
use skillbank_types::models::EntryKind;
use tracing::debug;

use crate::{LedgerError, Result};

/// Signed change to a wallet's available and reserved funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub available: i64,
    pub reserved: i64,
}

impl BalanceDelta {
    pub fn credit(amount: i64) -> Self {
        Self {
            available: amount,
            reserved: 0,
        }
    }

    pub fn debit(amount: i64) -> Self {
        Self {
            available: -amount,
            reserved: 0,
        }
    }

    /// Available -> reserved, when a withdrawal is requested.
    pub fn escrow(amount: i64) -> Self {
        Self {
            available: -amount,
            reserved: amount,
        }
    }

    /// Reserved funds leave the wallet on approval.
    pub fn payout(amount: i64) -> Self {
        Self {
            available: 0,
            reserved: -amount,
        }
    }

    /// Reserved -> available, when a withdrawal is rejected.
    pub fn refund(amount: i64) -> Self {
        Self {
            available: amount,
            reserved: -amount,
        }
    }
}

/// Applies `delta` to the user's balance and records a ledger entry, both on
/// `conn`. Fails with [`LedgerError::InsufficientFunds`] when available funds
/// would go negative; the row is left untouched in that case.
pub fn apply_delta(
    conn: &Connection,
    user_id: &str,
    delta: BalanceDelta,
    kind: EntryKind,
    source: &str,
    reference_id: Option<&str>,
) -> Result<BalanceRow> {
    balances::ensure_balance(conn, user_id)?;

    match balances::apply_guarded_delta(conn, user_id, delta.available, delta.reserved)? {
        Some(after) => {
            balances::insert_ledger_entry(
                conn,
                kind,
                source,
                delta.available,
                delta.reserved,
                &after,
                reference_id,
            )?;
            debug!(
                "balance {user_id}: {:+}/{:+} ({kind}, {source}) -> {}/{} v{}",
                delta.available,
                delta.reserved,
                after.balance,
                after.reserved_balance,
                after.version
            );
            Ok(after)
        }
        None => {
            let current = balances::balance_for_user(conn, user_id)?.ok_or_else(|| {
                LedgerError::Invariant(format!("balance row for {user_id} missing"))
            })?;
            if current.balance + delta.available < 0 {
                Err(LedgerError::InsufficientFunds {
                    available: current.balance,
                    requested: -delta.available,
                })
            } else {
                Err(LedgerError::Invariant(format!(
                    "reserved balance for {user_id} would go negative ({} {:+})",
                    current.reserved_balance, delta.reserved
                )))
            }
        }
    }
}
