//! Row -> response conversions. Stored ids are UUID text; a row that fails to
//! parse is reported as an internal error rather than silently dropped.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use skillbank_db::models::{
    BalanceRow, ChargeRow, LedgerEntryRow, NotificationRow, PaymentRow, WithdrawalRow,
};
use skillbank_ledger::reconcile::Reconciliation;
use skillbank_types::api::{
    BalanceResponse, ChargeResponse, LedgerEntryResponse, NotificationResponse, PaymentResponse,
    ReconciliationResponse, WithdrawalResponse,
};
use skillbank_types::time::parse_sqlite_timestamp;

use crate::error::ApiError;

fn id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::internal(&format!("Stored id '{raw}' is not a UUID"), e))
}

fn opt_id(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    raw.map(id).transpose()
}

fn ts(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_sqlite_timestamp)
}

pub fn many<R, T>(rows: Vec<R>, f: fn(R) -> Result<T, ApiError>) -> Result<Vec<T>, ApiError> {
    rows.into_iter().map(f).collect()
}

pub fn balance(row: BalanceRow) -> Result<BalanceResponse, ApiError> {
    Ok(BalanceResponse {
        user_id: id(&row.user_id)?,
        balance: row.balance,
        reserved_balance: row.reserved_balance,
        version: row.version,
        updated_at: ts(Some(&row.updated_at)),
    })
}

pub fn entry(row: LedgerEntryRow) -> Result<LedgerEntryResponse, ApiError> {
    Ok(LedgerEntryResponse {
        id: id(&row.id)?,
        kind: row.kind,
        source: row.source,
        balance_delta: row.balance_delta,
        reserved_delta: row.reserved_delta,
        balance_after: row.balance_after,
        reserved_after: row.reserved_after,
        reference_id: row.reference_id,
        created_at: ts(Some(&row.created_at)),
    })
}

pub fn reconciliation(report: Reconciliation) -> Result<ReconciliationResponse, ApiError> {
    Ok(ReconciliationResponse {
        user_id: id(&report.user_id)?,
        consistent: report.is_consistent(),
        balance: report.balance,
        reserved_balance: report.reserved_balance,
        ledger_balance: report.ledger_balance,
        ledger_reserved: report.ledger_reserved,
        pending_withdrawals: report.pending_withdrawals,
    })
}

pub fn charge(row: ChargeRow) -> Result<ChargeResponse, ApiError> {
    Ok(ChargeResponse {
        id: id(&row.id)?,
        user_id: id(&row.user_id)?,
        amount: row.amount,
        payer_phone: row.payer_phone,
        external_txn_id: row.external_txn_id,
        proof_path: row.proof_path,
        status: row.status,
        verified_by: opt_id(row.verified_by.as_deref())?,
        verification_notes: row.verification_notes,
        verified_at: ts(row.verified_at.as_deref()),
        created_at: ts(Some(&row.created_at)),
    })
}

pub fn withdrawal(row: WithdrawalRow) -> Result<WithdrawalResponse, ApiError> {
    Ok(WithdrawalResponse {
        id: id(&row.id)?,
        user_id: id(&row.user_id)?,
        amount: row.amount,
        destination: row.destination,
        user_notes: row.user_notes,
        status: row.status,
        admin_id: opt_id(row.admin_id.as_deref())?,
        admin_notes: row.admin_notes,
        resolved_at: ts(row.resolved_at.as_deref()),
        created_at: ts(Some(&row.created_at)),
    })
}

pub fn payment(row: PaymentRow) -> Result<PaymentResponse, ApiError> {
    Ok(PaymentResponse {
        id: id(&row.id)?,
        sender_id: id(&row.sender_id)?,
        recipient_id: id(&row.recipient_id)?,
        amount: row.amount,
        note: row.note,
        status: row.status,
        created_at: ts(Some(&row.created_at)),
    })
}

pub fn notification(row: NotificationRow) -> Result<NotificationResponse, ApiError> {
    Ok(NotificationResponse {
        id: id(&row.id)?,
        kind: row.kind,
        title: row.title,
        body: row.body,
        related_id: row.related_id,
        read: row.read_at.is_some(),
        created_at: ts(Some(&row.created_at)),
    })
}
