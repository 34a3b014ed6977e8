use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ChargeStatus, EntryKind, NotificationKind, PaymentStatus, Role, WithdrawalStatus,
};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
    pub token: String,
}

// -- Wallet --

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub reserved_balance: i64,
    pub version: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub kind: EntryKind,
    pub source: String,
    pub balance_delta: i64,
    pub reserved_delta: i64,
    pub balance_after: i64,
    pub reserved_after: i64,
    pub reference_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub reserved_balance: i64,
    pub ledger_balance: i64,
    pub ledger_reserved: i64,
    pub pending_withdrawals: i64,
    pub consistent: bool,
}

// -- Proofs --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofUploadResponse {
    pub path: String,
    pub sha256: String,
    pub url: String,
}

// -- Deposits --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitChargeRequest {
    pub amount: i64,
    pub payer_phone: String,
    pub external_txn_id: String,
    pub proof_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub payer_phone: String,
    pub external_txn_id: String,
    pub proof_path: String,
    pub status: ChargeStatus,
    pub verified_by: Option<Uuid>,
    pub verification_notes: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Admin decision payload shared by deposit and withdrawal review.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

// -- Withdrawals --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWithdrawalRequest {
    pub amount: i64,
    pub destination: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub destination: String,
    pub user_notes: Option<String>,
    pub status: WithdrawalStatus,
    pub admin_id: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

// -- Payments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendPaymentRequest {
    pub recipient_username: String,
    pub amount: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: i64,
    pub note: Option<String>,
    pub status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

// -- Notifications --

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub unread: i64,
    pub notifications: Vec<NotificationResponse>,
}

// -- Roles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignRoleRequest {
    pub username: String,
    pub role: Role,
    /// `false` revokes the role.
    #[serde(default = "default_grant")]
    pub grant: bool,
}

fn default_grant() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RolesResponse {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}
