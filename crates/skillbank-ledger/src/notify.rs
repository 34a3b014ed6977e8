//! Notification text for each workflow transition. The rows are enqueued on
//! the workflow's transaction and delivered later by the outbox relay.

use skillbank_db::models::{ChargeRow, NewNotification, WithdrawalRow};
use skillbank_types::models::{NotificationKind, Role};

pub const CURRENCY: &str = "IQD";

/// `25000` -> `"25,000 IQD"`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} {CURRENCY}")
}

fn reason(notes: Option<&str>) -> &str {
    notes.unwrap_or("no reason given")
}

pub fn deposit_verified(charge: &ChargeRow) -> NewNotification {
    NewNotification {
        user_id: charge.user_id.clone(),
        kind: NotificationKind::DepositVerified,
        title: "Deposit verified".into(),
        body: format!(
            "Your deposit of {} has been credited to your wallet.",
            format_amount(charge.amount)
        ),
        related_id: Some(charge.id.clone()),
    }
}

pub fn deposit_rejected(charge: &ChargeRow) -> NewNotification {
    NewNotification {
        user_id: charge.user_id.clone(),
        kind: NotificationKind::DepositRejected,
        title: "Deposit rejected".into(),
        body: format!(
            "Your deposit of {} was rejected: {}",
            format_amount(charge.amount),
            reason(charge.verification_notes.as_deref())
        ),
        related_id: Some(charge.id.clone()),
    }
}

pub fn withdrawal_requested(request: &WithdrawalRow) -> NewNotification {
    NewNotification {
        user_id: request.user_id.clone(),
        kind: NotificationKind::WithdrawalRequested,
        title: "Withdrawal requested".into(),
        body: format!(
            "{} is on hold until your withdrawal to {} is reviewed.",
            format_amount(request.amount),
            request.destination
        ),
        related_id: Some(request.id.clone()),
    }
}

pub fn withdrawal_approved(request: &WithdrawalRow) -> NewNotification {
    NewNotification {
        user_id: request.user_id.clone(),
        kind: NotificationKind::WithdrawalApproved,
        title: "Withdrawal approved".into(),
        body: format!(
            "Your withdrawal of {} to {} has been sent.",
            format_amount(request.amount),
            request.destination
        ),
        related_id: Some(request.id.clone()),
    }
}

pub fn withdrawal_rejected(request: &WithdrawalRow) -> NewNotification {
    NewNotification {
        user_id: request.user_id.clone(),
        kind: NotificationKind::WithdrawalRejected,
        title: "Withdrawal rejected".into(),
        body: format!(
            "Your withdrawal of {} was rejected and returned to your balance: {}",
            format_amount(request.amount),
            reason(request.admin_notes.as_deref())
        ),
        related_id: Some(request.id.clone()),
    }
}

pub fn payment_received(
    recipient_id: &str,
    sender_username: &str,
    amount: i64,
    note: Option<&str>,
    payment_id: &str,
) -> NewNotification {
    let mut body = format!("{sender_username} sent you {}.", format_amount(amount));
    if let Some(note) = note {
        body.push_str(&format!(" Note: {note}"));
    }
    NewNotification {
        user_id: recipient_id.to_string(),
        kind: NotificationKind::PaymentReceived,
        title: "Payment received".into(),
        body,
        related_id: Some(payment_id.to_string()),
    }
}

pub fn role_changed(user_id: &str, role: Role, granted: bool) -> NewNotification {
    let body = if granted {
        format!("You have been granted the {role} role.")
    } else {
        format!("Your {role} role has been revoked.")
    };
    NewNotification {
        user_id: user_id.to_string(),
        kind: NotificationKind::RoleChanged,
        title: "Role updated".into(),
        body,
        related_id: None,
    }
}
