use skillbank_db::queries::{balances, users, withdrawals};
use skillbank_types::models::Principal;
use tracing::warn;

use crate::{Ledger, LedgerError, Result};

/// Stored balance next to what the ledger and pending requests say it should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub user_id: String,
    pub balance: i64,
    pub reserved_balance: i64,
    pub ledger_balance: i64,
    pub ledger_reserved: i64,
    pub pending_withdrawals: i64,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_balance
            && self.reserved_balance == self.ledger_reserved
            && self.reserved_balance == self.pending_withdrawals
    }
}

impl Ledger {
    /// Admins may reconcile anyone; other users only themselves.
    pub fn reconcile(&self, principal: &Principal, user_id: &str) -> Result<Reconciliation> {
        if !principal.is_admin() && principal.id_string() != user_id {
            return Err(LedgerError::Forbidden("cannot reconcile another user's wallet"));
        }

        let report = self.db.with_tx(|tx| {
            let balance = balances::balance_for_user(tx, user_id)?;
            if balance.is_none() && users::user_by_id(tx, user_id)?.is_none() {
                return Err(LedgerError::NotFound(format!("user {user_id}")));
            }
            let (ledger_balance, ledger_reserved) = balances::ledger_sums(tx, user_id)?;
            let pending_withdrawals = withdrawals::pending_withdrawal_sum(tx, user_id)?;
            Ok(Reconciliation {
                user_id: user_id.to_string(),
                balance: balance.as_ref().map_or(0, |b| b.balance),
                reserved_balance: balance.as_ref().map_or(0, |b| b.reserved_balance),
                ledger_balance,
                ledger_reserved,
                pending_withdrawals,
            })
        })?;

        if !report.is_consistent() {
            warn!("Reconciliation mismatch for {user_id}: {report:?}");
        }
        Ok(report)
    }
}
