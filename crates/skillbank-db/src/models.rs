//! Database row types. These map directly to SQLite rows.
//! Distinct from skillbank-types API models to keep the DB layer independent.
//! Ids and timestamps stay as the TEXT SQLite stores; tags are parsed on read.

use skillbank_types::models::{
    ChargeStatus, EntryKind, NotificationKind, PaymentStatus, WithdrawalStatus,
};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub user_id: String,
    pub balance: i64,
    pub reserved_balance: i64,
    pub version: i64,
    pub updated_at: String,
}

impl BalanceRow {
    pub fn total(&self) -> i64 {
        self.balance + self.reserved_balance
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntryRow {
    pub id: String,
    pub user_id: String,
    pub kind: EntryKind,
    pub source: String,
    pub balance_delta: i64,
    pub reserved_delta: i64,
    pub balance_after: i64,
    pub reserved_after: i64,
    pub reference_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChargeRow {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub payer_phone: String,
    pub external_txn_id: String,
    pub proof_path: String,
    pub proof_sha256: String,
    pub status: ChargeStatus,
    pub verified_by: Option<String>,
    pub verification_notes: Option<String>,
    pub verified_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct WithdrawalRow {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub destination: String,
    pub user_notes: Option<String>,
    pub status: WithdrawalStatus,
    pub admin_id: Option<String>,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct PaymentRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub amount: i64,
    pub note: Option<String>,
    pub status: PaymentStatus,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub related_id: Option<String>,
    pub read_at: Option<String>,
    pub delivered_at: Option<String>,
    pub delivery_attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// A notification to enqueue; the row id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub related_id: Option<String>,
}
