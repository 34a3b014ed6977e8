use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned when a stored or submitted tag does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a string-tagged enum that round-trips through SQLite TEXT columns
/// and JSON with the same lowercase spelling.
macro_rules! tagged_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $tag)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseTagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(ParseTagError { kind: $label, value: s.to_string() }),
                }
            }
        }
    };
}

tagged_enum!(
    /// Roles beyond the implicit `user` role every account has.
    Role, "role" {
        User => "user",
        Admin => "admin",
        Owner => "owner",
    }
);

tagged_enum!(
    /// Lifecycle of a deposit claim.
    ChargeStatus, "charge status" {
        Pending => "pending",
        Verified => "verified",
        Rejected => "rejected",
    }
);

tagged_enum!(
    /// Lifecycle of a payout request.
    WithdrawalStatus, "withdrawal status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

tagged_enum!(
    PaymentStatus, "payment status" {
        Completed => "completed",
    }
);

tagged_enum!(
    /// Classification of a ledger entry.
    EntryKind, "entry kind" {
        Deposit => "deposit",
        Payment => "payment",
        Withdrawal => "withdrawal",
    }
);

tagged_enum!(
    /// What a notification is about.
    NotificationKind, "notification kind" {
        DepositVerified => "deposit_verified",
        DepositRejected => "deposit_rejected",
        WithdrawalRequested => "withdrawal_requested",
        WithdrawalApproved => "withdrawal_approved",
        WithdrawalRejected => "withdrawal_rejected",
        PaymentReceived => "payment_received",
        RoleChanged => "role_changed",
    }
);

tagged_enum!(
    SortOrder, "sort order" {
        Asc => "asc",
        Desc => "desc",
    }
);

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Provenance tags recorded on ledger entries.
pub mod source {
    pub const ZAINCASH_MANUAL: &str = "zaincash_manual";
    pub const WALLET: &str = "wallet";
    pub const WITHDRAWAL_ESCROW: &str = "withdrawal_escrow";
    pub const WITHDRAWAL_PAYOUT: &str = "withdrawal_payout";
    pub const WITHDRAWAL_REFUND: &str = "withdrawal_refund";
}

/// The authenticated acting user, resolved once per request and handed
/// explicitly to every ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: Uuid, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        role == Role::User || self.roles.contains(&role)
    }

    /// Owners can do everything admins can.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin) || self.has_role(Role::Owner)
    }

    pub fn is_owner(&self) -> bool {
        self.has_role(Role::Owner)
    }

    pub fn id_string(&self) -> String {
        self.user_id.to_string()
    }
}
