use skillbank_db::models::PaymentRow;
use skillbank_db::queries::notifications::enqueue_notification;
use skillbank_db::queries::{payments, users};
use skillbank_types::models::{EntryKind, Principal, SortOrder, source};
use tracing::info;

use crate::balance::{BalanceDelta, apply_delta};
use crate::{Ledger, LedgerError, Result, notify, optional_text, required_text};

const MAX_NOTE_LEN: usize = 280;

impl Ledger {
    /// Transfers `amount` from the principal to the user named
    /// `recipient_username`. The payment record, both balance changes and the
    /// recipient's notification commit together or not at all.
    pub fn send_payment(
        &self,
        principal: &Principal,
        recipient_username: &str,
        amount: i64,
        note: Option<&str>,
    ) -> Result<PaymentRow> {
        self.limits.check_amount(amount)?;
        let recipient_username = required_text("recipient_username", recipient_username, 64)?;
        let note = optional_text("note", note, MAX_NOTE_LEN)?;
        let sender_id = principal.id_string();
        let payment_id = uuid::Uuid::new_v4().to_string();

        let payment = self.db.with_tx(|tx| {
            let recipient = users::user_by_username(tx, recipient_username)?
                .ok_or_else(|| LedgerError::NotFound(format!("user {recipient_username}")))?;
            if recipient.id == sender_id {
                return Err(LedgerError::Validation("cannot send a payment to yourself".into()));
            }

            let payment =
                payments::insert_payment(tx, &payment_id, &sender_id, &recipient.id, amount, note)?;
            apply_delta(
                tx,
                &sender_id,
                BalanceDelta::debit(amount),
                EntryKind::Payment,
                source::WALLET,
                Some(&payment.id),
            )?;
            apply_delta(
                tx,
                &recipient.id,
                BalanceDelta::credit(amount),
                EntryKind::Payment,
                source::WALLET,
                Some(&payment.id),
            )?;
            enqueue_notification(
                tx,
                &notify::payment_received(
                    &recipient.id,
                    &principal.username,
                    amount,
                    note,
                    &payment.id,
                ),
            )?;
            Ok(payment)
        })?;

        info!(
            "Payment {} of {} from {} to {}",
            payment.id, payment.amount, principal.username, recipient_username
        );
        Ok(payment)
    }

    pub fn my_payments(
        &self,
        principal: &Principal,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<PaymentRow>> {
        Ok(self.db.list_payments(&principal.id_string(), order, limit)?)
    }
}
