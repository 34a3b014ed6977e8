//! Manual deposit verification.
//!
//! A user claims an external payment with a proof file; an administrator
//! checks it out-of-band and either credits the wallet or rejects the claim.

use skillbank_db::models::ChargeRow;
use skillbank_db::queries::charges::{self, NewCharge};
use skillbank_db::queries::notifications::enqueue_notification;
use skillbank_types::models::{ChargeStatus, EntryKind, Principal, SortOrder, source};
use tracing::info;

use crate::balance::{BalanceDelta, apply_delta};
use crate::{Ledger, LedgerError, Result, notify, optional_text, require_admin, required_text};

const MAX_PHONE_LEN: usize = 32;
const MAX_TXN_ID_LEN: usize = 128;
const MAX_NOTES_LEN: usize = 500;

/// A stored proof file, as returned by the proof upload endpoint.
#[derive(Debug, Clone)]
pub struct ProofRef {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ChargeClaim {
    pub amount: i64,
    pub payer_phone: String,
    pub external_txn_id: String,
    pub proof: ProofRef,
}

impl Ledger {
    pub fn submit_charge(&self, principal: &Principal, claim: &ChargeClaim) -> Result<ChargeRow> {
        self.limits.check_amount(claim.amount)?;
        let payer_phone = required_text("payer_phone", &claim.payer_phone, MAX_PHONE_LEN)?;
        let external_txn_id =
            required_text("external_txn_id", &claim.external_txn_id, MAX_TXN_ID_LEN)?;

        let user_id = principal.id_string();
        if !claim.proof.path.starts_with(&format!("{user_id}/")) {
            return Err(LedgerError::Validation(
                "proof must be one of your own uploads".into(),
            ));
        }
        if claim.proof.sha256.len() != 64 {
            return Err(LedgerError::Validation("proof digest is malformed".into()));
        }

        let charge = self.db.with_tx(|tx| {
            if let Some(existing) =
                charges::live_charge_conflict(tx, external_txn_id, &claim.proof.sha256)?
            {
                let what = if existing.external_txn_id == external_txn_id {
                    "transaction id"
                } else {
                    "proof"
                };
                return Err(LedgerError::Duplicate(format!(
                    "this {what} was already submitted in charge {}",
                    existing.id
                )));
            }

            Ok(charges::insert_charge(
                tx,
                &NewCharge {
                    user_id: &user_id,
                    amount: claim.amount,
                    payer_phone,
                    external_txn_id,
                    proof_path: &claim.proof.path,
                    proof_sha256: &claim.proof.sha256,
                },
            )?)
        })?;

        info!(
            "Charge {} submitted by {} for {}",
            charge.id, principal.username, charge.amount
        );
        Ok(charge)
    }

    pub fn verify_charge(
        &self,
        principal: &Principal,
        charge_id: &str,
        notes: Option<&str>,
    ) -> Result<ChargeRow> {
        self.resolve_charge(principal, charge_id, ChargeStatus::Verified, notes)
    }

    pub fn reject_charge(
        &self,
        principal: &Principal,
        charge_id: &str,
        notes: Option<&str>,
    ) -> Result<ChargeRow> {
        self.resolve_charge(principal, charge_id, ChargeStatus::Rejected, notes)
    }

    fn resolve_charge(
        &self,
        principal: &Principal,
        charge_id: &str,
        status: ChargeStatus,
        notes: Option<&str>,
    ) -> Result<ChargeRow> {
        require_admin(principal)?;
        let notes = optional_text("notes", notes, MAX_NOTES_LEN)?;
        let admin_id = principal.id_string();

        let charge = self.db.with_tx(|tx| {
            let current = charges::charge_by_id(tx, charge_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("charge {charge_id}")))?;
            if current.status != ChargeStatus::Pending {
                return Err(LedgerError::InvalidState {
                    entity: "charge",
                    id: current.id,
                    status: current.status.to_string(),
                });
            }

            let resolved = charges::resolve_charge(tx, charge_id, status, &admin_id, notes)?
                .ok_or_else(|| {
                    LedgerError::Invariant(format!("charge {charge_id} left pending state"))
                })?;

            let notification = match status {
                ChargeStatus::Verified => {
                    apply_delta(
                        tx,
                        &resolved.user_id,
                        BalanceDelta::credit(resolved.amount),
                        EntryKind::Deposit,
                        source::ZAINCASH_MANUAL,
                        Some(&resolved.id),
                    )?;
                    notify::deposit_verified(&resolved)
                }
                _ => notify::deposit_rejected(&resolved),
            };
            enqueue_notification(tx, &notification)?;
            Ok(resolved)
        })?;

        info!(
            "Charge {} {} by {} ({} for user {})",
            charge.id, charge.status, principal.username, charge.amount, charge.user_id
        );
        Ok(charge)
    }

    pub fn my_charges(
        &self,
        principal: &Principal,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<ChargeRow>> {
        Ok(self
            .db
            .list_charges(Some(&principal.id_string()), None, order, limit)?)
    }

    pub fn all_charges(
        &self,
        principal: &Principal,
        status: Option<ChargeStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<ChargeRow>> {
        require_admin(principal)?;
        Ok(self.db.list_charges(None, status, order, limit)?)
    }
}
