//! Withdrawal requests with escrow.
//!
//! Requesting moves the amount from available to reserved funds, so the
//! balance guard is what admits or refuses a request. Approval pays the
//! reserved amount out; rejection returns it to the available balance.

use skillbank_db::models::WithdrawalRow;
use skillbank_db::queries::notifications::enqueue_notification;
use skillbank_db::queries::withdrawals;
use skillbank_types::models::{EntryKind, Principal, SortOrder, WithdrawalStatus, source};
use tracing::info;

use crate::balance::{BalanceDelta, apply_delta};
use crate::{Ledger, LedgerError, Result, notify, optional_text, require_admin, required_text};

const MAX_DESTINATION_LEN: usize = 64;
const MAX_NOTES_LEN: usize = 500;

impl Ledger {
    pub fn request_withdrawal(
        &self,
        principal: &Principal,
        amount: i64,
        destination: &str,
        notes: Option<&str>,
    ) -> Result<WithdrawalRow> {
        self.limits.check_withdrawal(amount)?;
        let destination = required_text("destination", destination, MAX_DESTINATION_LEN)?;
        let notes = optional_text("notes", notes, MAX_NOTES_LEN)?;
        let user_id = principal.id_string();
        let request_id = uuid::Uuid::new_v4().to_string();

        let request = self.db.with_tx(|tx| {
            // Request row first so the escrow entry can reference it.
            let request =
                withdrawals::insert_withdrawal(tx, &request_id, &user_id, amount, destination, notes)?;
            apply_delta(
                tx,
                &user_id,
                BalanceDelta::escrow(amount),
                EntryKind::Withdrawal,
                source::WITHDRAWAL_ESCROW,
                Some(&request.id),
            )?;
            enqueue_notification(tx, &notify::withdrawal_requested(&request))?;
            Ok::<_, LedgerError>(request)
        })?;

        info!(
            "Withdrawal {} requested by {} for {} to {}",
            request.id, principal.username, request.amount, request.destination
        );
        Ok(request)
    }

    pub fn approve_withdrawal(
        &self,
        principal: &Principal,
        request_id: &str,
        notes: Option<&str>,
    ) -> Result<WithdrawalRow> {
        self.resolve_withdrawal(principal, request_id, WithdrawalStatus::Approved, notes)
    }

    pub fn reject_withdrawal(
        &self,
        principal: &Principal,
        request_id: &str,
        notes: Option<&str>,
    ) -> Result<WithdrawalRow> {
        self.resolve_withdrawal(principal, request_id, WithdrawalStatus::Rejected, notes)
    }

    fn resolve_withdrawal(
        &self,
        principal: &Principal,
        request_id: &str,
        status: WithdrawalStatus,
        notes: Option<&str>,
    ) -> Result<WithdrawalRow> {
        require_admin(principal)?;
        let notes = optional_text("notes", notes, MAX_NOTES_LEN)?;
        let admin_id = principal.id_string();

        let request = self.db.with_tx(|tx| {
            let current = withdrawals::withdrawal_by_id(tx, request_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("withdrawal request {request_id}")))?;
            if current.status != WithdrawalStatus::Pending {
                return Err(LedgerError::InvalidState {
                    entity: "withdrawal request",
                    id: current.id,
                    status: current.status.to_string(),
                });
            }

            let resolved =
                withdrawals::resolve_withdrawal(tx, request_id, status, &admin_id, notes)?
                    .ok_or_else(|| {
                        LedgerError::Invariant(format!("withdrawal {request_id} left pending state"))
                    })?;

            let (delta, entry_source, notification) = match status {
                WithdrawalStatus::Approved => (
                    BalanceDelta::payout(resolved.amount),
                    source::WITHDRAWAL_PAYOUT,
                    notify::withdrawal_approved(&resolved),
                ),
                _ => (
                    BalanceDelta::refund(resolved.amount),
                    source::WITHDRAWAL_REFUND,
                    notify::withdrawal_rejected(&resolved),
                ),
            };
            apply_delta(
                tx,
                &resolved.user_id,
                delta,
                EntryKind::Withdrawal,
                entry_source,
                Some(&resolved.id),
            )?;
            enqueue_notification(tx, &notification)?;
            Ok(resolved)
        })?;

        info!(
            "Withdrawal {} {} by {} ({} for user {})",
            request.id, request.status, principal.username, request.amount, request.user_id
        );
        Ok(request)
    }

    pub fn my_withdrawals(
        &self,
        principal: &Principal,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<WithdrawalRow>> {
        Ok(self
            .db
            .list_withdrawals(Some(&principal.id_string()), None, order, limit)?)
    }

    pub fn all_withdrawals(
        &self,
        principal: &Principal,
        status: Option<WithdrawalStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<WithdrawalRow>> {
        require_admin(principal)?;
        Ok(self.db.list_withdrawals(None, status, order, limit)?)
    }
}
