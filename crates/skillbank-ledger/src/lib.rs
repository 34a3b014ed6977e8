//! Wallet ledger for the SkillBank marketplace.
//!
//! Every public operation on [`Ledger`] takes the acting [`Principal`]
//! explicitly and runs as one SQLite transaction: the balance mutation, the
//! ledger entry, the request record and the outbox notification either all
//! commit or none do.

pub mod balance;
pub mod deposits;
pub mod error;
pub mod inbox;
pub mod notify;
pub mod payments;
pub mod reconcile;
pub mod roles;
pub mod withdrawals;

use std::sync::Arc;

use skillbank_db::Database;
use skillbank_db::models::{BalanceRow, LedgerEntryRow};
use skillbank_db::queries::balances;
use skillbank_types::models::{Principal, SortOrder};

pub use error::{LedgerError, Result};

/// Amount bounds, in whole currency units.
#[derive(Debug, Clone, Copy)]
pub struct LedgerLimits {
    pub min_withdrawal: i64,
    pub max_amount: i64,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            min_withdrawal: 5_000,
            max_amount: 10_000_000,
        }
    }
}

impl LedgerLimits {
    pub(crate) fn check_amount(&self, amount: i64) -> Result<()> {
        self.check_range(amount, 1)
    }

    pub(crate) fn check_withdrawal(&self, amount: i64) -> Result<()> {
        self.check_range(amount, self.min_withdrawal.max(1))
    }

    fn check_range(&self, amount: i64, min: i64) -> Result<()> {
        if amount < min || amount > self.max_amount {
            return Err(LedgerError::InvalidAmount {
                min,
                max: self.max_amount,
            });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Ledger {
    db: Arc<Database>,
    limits: LedgerLimits,
}

impl Ledger {
    pub fn new(db: Arc<Database>, limits: LedgerLimits) -> Self {
        Self { db, limits }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The principal's own balance; the row is created on first access.
    pub fn balance(&self, principal: &Principal) -> Result<BalanceRow> {
        let user_id = principal.id_string();
        self.db.with_tx(|tx| {
            balances::ensure_balance(tx, &user_id)?;
            balances::balance_for_user(tx, &user_id)?
                .ok_or_else(|| LedgerError::Invariant(format!("balance row for {user_id} missing")))
        })
    }

    pub fn entries(
        &self,
        principal: &Principal,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<LedgerEntryRow>> {
        Ok(self
            .db
            .get_ledger_entries(&principal.id_string(), order, limit)?)
    }
}

pub(crate) fn require_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(LedgerError::Forbidden("administrator role required"))
    }
}

/// Trims a free-text field, rejecting empty or oversized values.
pub(crate) fn required_text<'a>(field: &str, value: &'a str, max_len: usize) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(LedgerError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed)
}

/// Like [`required_text`] but blank input becomes `None`.
pub(crate) fn optional_text<'a>(
    field: &str,
    value: Option<&'a str>,
    max_len: usize,
) -> Result<Option<&'a str>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max_len).map(Some),
    }
}
